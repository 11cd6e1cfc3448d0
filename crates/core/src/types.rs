//! Identifiers and lock kinds
//!
//! - [`SessionId`]: one per connected session, allocated by the database
//! - [`TableId`]: case-insensitive table name
//! - [`LockKind`]: Shared (readers) or Exclusive (single writer)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a connected session
///
/// Allocated monotonically by the database when a session connects.
/// Never reused within one database instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw session number
    pub const fn new(id: u64) -> Self {
        SessionId(id)
    }

    /// Raw session number
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        SessionId(id)
    }
}

/// Name of a table
///
/// Table names are case-insensitive: the name is normalized to upper case
/// on construction, so `test`, `Test` and `TEST` all identify the same table.
///
/// # Examples
///
/// ```
/// use strata_core::TableId;
///
/// assert_eq!(TableId::new("test"), TableId::new("TEST"));
/// assert_eq!(TableId::new("orders").as_str(), "ORDERS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(String);

impl TableId {
    /// Create a table id, normalizing the name to upper case
    pub fn new(name: impl AsRef<str>) -> Self {
        TableId(name.as_ref().trim().to_ascii_uppercase())
    }

    /// Normalized table name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableId {
    fn from(name: &str) -> Self {
        TableId::new(name)
    }
}

impl From<String> for TableId {
    fn from(name: String) -> Self {
        TableId::new(name)
    }
}

/// Kind of table lock
///
/// | Held \ Requested | Shared | Exclusive |
/// |------------------|--------|-----------|
/// | Shared (other)   | grant  | wait      |
/// | Exclusive (other)| wait   | wait      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockKind {
    /// Concurrent readers; excludes any Exclusive lock
    Shared,
    /// Single writer; excludes every other lock on the table
    Exclusive,
}

impl LockKind {
    /// Whether a lock of this kind already satisfies a request for `requested`
    ///
    /// Exclusive covers both kinds; Shared only covers Shared.
    #[inline]
    pub fn covers(self, requested: LockKind) -> bool {
        match self {
            LockKind::Exclusive => true,
            LockKind::Shared => requested == LockKind::Shared,
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKind::Shared => f.write_str("shared"),
            LockKind::Exclusive => f.write_str("exclusive"),
        }
    }
}
