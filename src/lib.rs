//! # Strata Locking
//!
//! Table-level lock manager and isolation coordinator for an embedded
//! relational engine.
//!
//! Sessions take Shared locks to read a table and Exclusive locks to write
//! it. A system-wide lock mode decides how long read locks live:
//!
//! | Lock mode | Isolation level | Read locks released |
//! |---|---|---|
//! | `OFF` (0) | READ_UNCOMMITTED | no locks taken |
//! | `SERIALIZABLE_TABLE` (1) | SERIALIZABLE | at commit/rollback |
//! | `READ_COMMITTED` (3) | READ_COMMITTED | after each statement |
//!
//! A request that cannot be granted waits in the table's FIFO queue and fails
//! with a lock timeout once the configured bound elapses.
//!
//! ## Quick Start
//!
//! ```ignore
//! use strata_locking::prelude::*;
//!
//! let db = Strata::builder().lock_timeout(Duration::from_millis(200)).open();
//!
//! let mut writer = db.connect();
//! writer.execute(&Statement::create_table("test", ["id"]))?;
//! writer.set_transaction_isolation(IsolationLevel::Serializable)?;
//! writer.set_auto_commit(false)?;
//! writer.execute(&Statement::insert("test", [1]))?;
//!
//! let mut reader = db.connect();
//! let err = reader.query("test").unwrap_err();
//! assert!(err.is_lock_timeout());
//!
//! writer.commit()?;
//! ```

#![warn(missing_docs)]

mod connection;
mod database;
mod error;
mod types;

pub mod prelude;

// Re-export main entry points
pub use connection::Connection;
pub use database::{Strata, StrataBuilder};
pub use error::{Error, Result};

// Re-export types
pub use types::*;
