//! Convenient imports.
//!
//! ```ignore
//! use strata_locking::prelude::*;
//!
//! let db = Strata::open();
//! let mut conn = db.connect();
//! conn.execute(&Statement::create_table("test", ["id"]))?;
//! ```

// Main entry point
pub use crate::connection::Connection;
pub use crate::database::{Strata, StrataBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Statements and results
pub use crate::types::{Output, Row, Statement, TransactionPhase, Value};

// Locking vocabulary
pub use crate::types::{IsolationLevel, LockKind, LockMode, SessionId, TableId};

pub use std::time::Duration;
