//! Transaction state and coordination
//!
//! A session owns one [`Transaction`]. The [`TransactionCoordinator`] drives
//! it through its lifecycle:
//!
//! ```text
//! Idle ──first statement──▶ InTransaction ──commit──▶ Committing ──▶ Idle
//!                                  │
//!                                  └──rollback──▶ RollingBack ──▶ Idle
//! ```
//!
//! Locks are acquired before each statement according to the lock mode
//! captured when the transaction began, and every lock is released when the
//! transaction ends.

pub mod coordinator;
pub mod undo;

pub use coordinator::TransactionCoordinator;
pub use undo::{UndoEntry, UndoLog};

use std::fmt;
use strata_core::{LockMode, SessionId};

/// Lifecycle phase of a session's transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionPhase {
    /// No statement executed since the last commit or rollback
    #[default]
    Idle,
    /// At least one statement executed
    InTransaction,
    /// Releasing locks after a commit
    Committing,
    /// Reversing writes and releasing locks after a rollback
    RollingBack,
}

impl fmt::Display for TransactionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionPhase::Idle => "idle",
            TransactionPhase::InTransaction => "in-transaction",
            TransactionPhase::Committing => "committing",
            TransactionPhase::RollingBack => "rolling-back",
        };
        f.write_str(name)
    }
}

/// Per-session transaction state
#[derive(Debug)]
pub struct Transaction {
    session: SessionId,
    phase: TransactionPhase,
    mode: Option<LockMode>,
    undo: UndoLog,
}

impl Transaction {
    /// Create an idle transaction for `session`
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            phase: TransactionPhase::Idle,
            mode: None,
            undo: UndoLog::new(),
        }
    }

    /// Owning session
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Current phase
    pub fn phase(&self) -> TransactionPhase {
        self.phase
    }

    /// Check if a transaction is open
    pub fn is_active(&self) -> bool {
        self.phase == TransactionPhase::InTransaction
    }

    /// Lock mode captured at the first statement, if a transaction is open
    pub fn lock_mode(&self) -> Option<LockMode> {
        self.mode
    }

    /// Row writes recorded so far
    pub fn undo_log(&self) -> &UndoLog {
        &self.undo
    }
}
