//! Unified error type for the public API.
//!
//! Wraps the layered `strata_core` error into a small set of user-facing
//! categories. A lock timeout stays its own variant so callers can recognize
//! it and decide whether to retry the statement or roll back.

use strata_core::TableId;
use thiserror::Error;

/// All errors returned by the public API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A lock could not be granted within the wait bound, or the waiting
    /// session was closed while it waited.
    ///
    /// The statement was aborted; locks taken earlier in the transaction are
    /// still held.
    #[error("lock timeout: {message}")]
    LockTimeout {
        /// Table whose lock was requested
        table: TableId,
        /// Full description of the failed wait
        message: String,
        /// Whether the wait ended because the session was closed
        session_closed: bool,
    },

    /// Invalid lock mode, isolation level, command or row
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Table or column not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation on a closed connection
    #[error("session closed: {0}")]
    SessionClosed(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for public API operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a lock timeout, including a wait ended by session close.
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Error::LockTimeout { .. })
    }

    /// Check if the failed statement may succeed if retried.
    ///
    /// Only a plain lock timeout is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::LockTimeout {
                session_closed: false,
                ..
            }
        )
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if the connection can no longer be used.
    pub fn is_session_closed(&self) -> bool {
        matches!(
            self,
            Error::SessionClosed(_)
                | Error::LockTimeout {
                    session_closed: true,
                    ..
                }
        )
    }
}

// Convert from internal core errors
impl From<strata_core::Error> for Error {
    fn from(e: strata_core::Error) -> Self {
        use strata_core::Error as CoreError;
        let message = e.to_string();
        match e {
            CoreError::LockTimeout { table, .. } => Error::LockTimeout {
                table,
                message,
                session_closed: false,
            },
            CoreError::SessionClosedWhileWaiting { table, .. } => Error::LockTimeout {
                table,
                message,
                session_closed: true,
            },
            CoreError::InvalidModeTransition { .. }
            | CoreError::InvalidIsolationLevel { .. }
            | CoreError::TableExists { .. }
            | CoreError::ColumnCountMismatch { .. }
            | CoreError::InvalidCommand { .. } => Error::InvalidArgument(message),
            CoreError::TableNotFound { .. } | CoreError::ColumnNotFound { .. } => {
                Error::NotFound(message)
            }
            CoreError::SessionClosed { .. } => Error::SessionClosed(message),
            CoreError::Config(msg) => Error::Config(msg),
        }
    }
}
