//! Lock modes and isolation levels
//!
//! [`LockMode`] is the system-wide mechanism setting; [`IsolationLevel`] is
//! the per-session view over it. Both carry the integer surface values used
//! by the configuration command and the connection API.
//!
//! | LockMode | value | IsolationLevel | value |
//! |----------|-------|----------------|-------|
//! | Off | 0 | ReadUncommitted | 1 |
//! | SerializableTable | 1 | Serializable | 8 |
//! | ReadCommitted | 3 | ReadCommitted | 2 |

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// System-wide locking discipline
///
/// Exactly one mode is active per database at any instant. The mode is read
/// when a transaction starts; changing it never alters locks already granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum LockMode {
    /// No table locks are taken
    Off,
    /// Shared for reads, Exclusive for writes, all held until commit/rollback
    SerializableTable,
    /// Shared for reads released after each statement, Exclusive held until commit/rollback
    ReadCommitted,
}

impl LockMode {
    /// Integer value reported by `LOCK_MODE()`
    pub const fn as_i32(self) -> i32 {
        match self {
            LockMode::Off => 0,
            LockMode::SerializableTable => 1,
            LockMode::ReadCommitted => 3,
        }
    }

    /// Parse the integer value accepted by `SET LOCK_MODE`
    ///
    /// Returns `Error::InvalidModeTransition` for any value other than 0, 1 or 3.
    pub fn from_i32(value: i32) -> Result<Self, Error> {
        match value {
            0 => Ok(LockMode::Off),
            1 => Ok(LockMode::SerializableTable),
            3 => Ok(LockMode::ReadCommitted),
            other => Err(Error::InvalidModeTransition { value: other }),
        }
    }

    /// Whether statements take table locks under this mode
    pub const fn is_locking(self) -> bool {
        !matches!(self, LockMode::Off)
    }
}

impl Default for LockMode {
    fn default() -> Self {
        LockMode::ReadCommitted
    }
}

impl TryFrom<i32> for LockMode {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        LockMode::from_i32(value)
    }
}

impl From<LockMode> for i32 {
    fn from(mode: LockMode) -> Self {
        mode.as_i32()
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Off => f.write_str("OFF"),
            LockMode::SerializableTable => f.write_str("SERIALIZABLE_TABLE"),
            LockMode::ReadCommitted => f.write_str("READ_COMMITTED"),
        }
    }
}

/// Session-visible transaction isolation level
///
/// Values follow the standard connection API constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum IsolationLevel {
    /// Dirty reads allowed
    ReadUncommitted,
    /// Reads see committed data; read locks end with the statement
    ReadCommitted,
    /// Table locks held until the transaction ends
    Serializable,
}

impl IsolationLevel {
    /// Connection API constant
    pub const fn as_i32(self) -> i32 {
        match self {
            IsolationLevel::ReadUncommitted => 1,
            IsolationLevel::ReadCommitted => 2,
            IsolationLevel::Serializable => 8,
        }
    }

    /// Parse a connection API constant
    ///
    /// `REPEATABLE_READ` (4) and `NONE` (0) are not supported.
    pub fn from_i32(value: i32) -> Result<Self, Error> {
        match value {
            1 => Ok(IsolationLevel::ReadUncommitted),
            2 => Ok(IsolationLevel::ReadCommitted),
            8 => Ok(IsolationLevel::Serializable),
            other => Err(Error::InvalidIsolationLevel { value: other }),
        }
    }
}

impl Default for IsolationLevel {
    fn default() -> Self {
        IsolationLevel::ReadCommitted
    }
}

impl TryFrom<i32> for IsolationLevel {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        IsolationLevel::from_i32(value)
    }
}

impl From<IsolationLevel> for i32 {
    fn from(level: IsolationLevel) -> Self {
        level.as_i32()
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationLevel::ReadUncommitted => f.write_str("READ_UNCOMMITTED"),
            IsolationLevel::ReadCommitted => f.write_str("READ_COMMITTED"),
            IsolationLevel::Serializable => f.write_str("SERIALIZABLE"),
        }
    }
}
