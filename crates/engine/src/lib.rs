//! Engine layer for Strata
//!
//! Ties the lock manager to statement execution:
//! - [`Database`]: owns the lock manager, table store and session registry
//! - [`Session`]: one connection; executes statements and controls its transaction
//! - [`TransactionCoordinator`]: per-statement locking and commit/rollback
//! - [`TableStore`]: in-memory tables, written in place
//! - [`ConfigCommand`]: `SET LOCK_MODE`, `CALL LOCK_MODE()`, `SET LOCK_TIMEOUT`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod database;
pub mod session;
pub mod statement;
pub mod storage;
pub mod transaction;

pub use command::ConfigCommand;
pub use database::{Database, DatabaseBuilder};
pub use session::Session;
pub use statement::{Output, Statement};
pub use storage::{RowId, TableStore, UpdatedCells};
pub use transaction::{Transaction, TransactionCoordinator, TransactionPhase, UndoEntry, UndoLog};
