//! Isolation policy: lock mode → per-statement locking behavior
//!
//! | LockMode | Read statement | Write statement | Read-lock release point |
//! |---|---|---|---|
//! | Off | no lock | no lock | n/a |
//! | ReadCommitted | Shared | Exclusive | after the statement |
//! | SerializableTable | Shared | Exclusive | at commit/rollback |
//!
//! This table is the only place isolation behavior is decided. The
//! coordinator asks it what to lock before a statement and what to release
//! after; the session asks it how isolation levels and lock modes map onto
//! each other.

use strata_core::{IsolationLevel, LockKind, LockMode};

/// What a statement does to a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Reads rows only
    Read,
    /// Inserts, updates or deletes rows
    Write,
}

/// When Shared locks taken by reads are released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLockRelease {
    /// No read locks are taken
    NotApplicable,
    /// Released as soon as the statement completes
    AfterStatement,
    /// Held until commit or rollback
    AtTransactionEnd,
}

/// Pure mapping from lock mode to locking behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct IsolationPolicy;

impl IsolationPolicy {
    /// Lock a statement of `kind` must hold on each table it touches
    pub const fn lock_for(mode: LockMode, kind: StatementKind) -> Option<LockKind> {
        if !mode.is_locking() {
            return None;
        }
        match kind {
            StatementKind::Read => Some(LockKind::Shared),
            StatementKind::Write => Some(LockKind::Exclusive),
        }
    }

    /// When read locks taken under `mode` are released
    pub const fn read_lock_release(mode: LockMode) -> ReadLockRelease {
        match mode {
            LockMode::Off => ReadLockRelease::NotApplicable,
            LockMode::ReadCommitted => ReadLockRelease::AfterStatement,
            LockMode::SerializableTable => ReadLockRelease::AtTransactionEnd,
        }
    }

    /// Whether read locks must be dropped once a statement completes
    pub const fn releases_reads_after_statement(mode: LockMode) -> bool {
        matches!(
            Self::read_lock_release(mode),
            ReadLockRelease::AfterStatement
        )
    }

    /// Lock mode implied by setting a session's isolation level
    pub const fn lock_mode_for(level: IsolationLevel) -> LockMode {
        match level {
            IsolationLevel::ReadUncommitted => LockMode::Off,
            IsolationLevel::ReadCommitted => LockMode::ReadCommitted,
            IsolationLevel::Serializable => LockMode::SerializableTable,
        }
    }

    /// Isolation level a session reports under `mode`
    pub const fn isolation_level_for(mode: LockMode) -> IsolationLevel {
        match mode {
            LockMode::Off => IsolationLevel::ReadUncommitted,
            LockMode::ReadCommitted => IsolationLevel::ReadCommitted,
            LockMode::SerializableTable => IsolationLevel::Serializable,
        }
    }
}
