//! Error types for the lock manager and isolation coordinator
//!
//! Every failure surfaced by the lower layers is a variant of [`Error`].
//! Lock failures are distinct variants rather than a generic error with a
//! vendor code, so callers can match on them directly.
//!
//! ## Error Codes (Canonical)
//!
//! | Code | Description |
//! |------|-------------|
//! | LockTimeout | Lock request not granted within the wait bound |
//! | LockTimeout | Waiter's own session was closed (`SessionClosedWhileWaiting`) |
//! | InvalidModeTransition | Unrecognized lock mode value |
//! | InvalidIsolationLevel | Unsupported isolation level value |
//! | SessionClosed | Operation on a closed session |
//! | TableNotFound | Table does not exist |
//! | TableExists | Table already exists |
//! | ColumnNotFound | Column does not exist |
//! | ColumnCountMismatch | Row width does not match the table |
//! | InvalidCommand | Configuration command not recognized |
//! | Config | Invalid configuration |

use crate::types::{SessionId, TableId};
use std::time::Duration;
use thiserror::Error;

/// Result type alias using the core [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// All errors raised by the lock manager, coordinator and engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Lock request not granted within the configured wait bound
    ///
    /// Transient: the statement is aborted, the session keeps every lock it
    /// already held and may retry or commit.
    #[error("lock timeout on table {table} for session {session} after {waited:?}")]
    LockTimeout {
        /// Table whose lock was requested
        table: TableId,
        /// Session that waited
        session: SessionId,
        /// How long the request waited
        waited: Duration,
    },

    /// A queued lock request was cancelled because its own session was closed
    #[error("session {session} closed while waiting for a lock on table {table}")]
    SessionClosedWhileWaiting {
        /// Table whose lock was requested
        table: TableId,
        /// Session that was closed
        session: SessionId,
    },

    /// Lock mode value other than 0, 1 or 3
    #[error("invalid lock mode: {value}")]
    InvalidModeTransition {
        /// Rejected value
        value: i32,
    },

    /// Unsupported isolation level constant
    #[error("unsupported transaction isolation level: {value}")]
    InvalidIsolationLevel {
        /// Rejected value
        value: i32,
    },

    /// Operation attempted on a closed session
    #[error("session {session} is closed")]
    SessionClosed {
        /// Closed session
        session: SessionId,
    },

    /// Table does not exist
    #[error("table {table} not found")]
    TableNotFound {
        /// Missing table
        table: TableId,
    },

    /// Table already exists
    #[error("table {table} already exists")]
    TableExists {
        /// Existing table
        table: TableId,
    },

    /// Column does not exist in the table
    #[error("column {column} not found in table {table}")]
    ColumnNotFound {
        /// Table searched
        table: TableId,
        /// Missing column
        column: String,
    },

    /// Inserted row width differs from the table's column count
    #[error("table {table} has {expected} column(s), got {actual} value(s)")]
    ColumnCountMismatch {
        /// Target table
        table: TableId,
        /// Number of columns in the table
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// Configuration command not recognized or malformed
    #[error("invalid command '{command}': {reason}")]
    InvalidCommand {
        /// Command text as received
        command: String,
        /// Why it was rejected
        reason: String,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Canonical error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::LockTimeout { .. } | Error::SessionClosedWhileWaiting { .. } => "LockTimeout",
            Error::InvalidModeTransition { .. } => "InvalidModeTransition",
            Error::InvalidIsolationLevel { .. } => "InvalidIsolationLevel",
            Error::SessionClosed { .. } => "SessionClosed",
            Error::TableNotFound { .. } => "TableNotFound",
            Error::TableExists { .. } => "TableExists",
            Error::ColumnNotFound { .. } => "ColumnNotFound",
            Error::ColumnCountMismatch { .. } => "ColumnCountMismatch",
            Error::InvalidCommand { .. } => "InvalidCommand",
            Error::Config(_) => "Config",
        }
    }

    /// Check if this is a lock timeout, including the closed-while-waiting case
    pub fn is_lock_timeout(&self) -> bool {
        matches!(
            self,
            Error::LockTimeout { .. } | Error::SessionClosedWhileWaiting { .. }
        )
    }

    /// Check if the failed statement may succeed on retry
    ///
    /// Only a plain timeout is retryable; a waiter whose session was closed
    /// has nothing left to retry with.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LockTimeout { .. })
    }

    /// Table the error refers to, if any
    pub fn table(&self) -> Option<&TableId> {
        match self {
            Error::LockTimeout { table, .. }
            | Error::SessionClosedWhileWaiting { table, .. }
            | Error::TableNotFound { table }
            | Error::TableExists { table }
            | Error::ColumnNotFound { table, .. }
            | Error::ColumnCountMismatch { table, .. } => Some(table),
            _ => None,
        }
    }
}
