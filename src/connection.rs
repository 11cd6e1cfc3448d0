//! Connection handle.
//!
//! A [`Connection`] is one client session with connection-API style
//! transaction control. Autocommit is on by default; turn it off to group
//! statements into a transaction that holds its locks until
//! [`Connection::commit`] or [`Connection::rollback`].
//!
//! # Example
//!
//! ```ignore
//! use strata_locking::prelude::*;
//!
//! let db = Strata::open();
//! let mut conn = db.connect();
//! conn.execute(&Statement::create_table("test", ["id"]))?;
//! conn.set_auto_commit(false)?;
//! conn.set_transaction_isolation(IsolationLevel::Serializable)?;
//! conn.execute(&Statement::insert("test", [1]))?;
//! conn.commit()?;
//! ```

use crate::error::Result;
use strata_core::{IsolationLevel, LockKind, LockMode, Row, SessionId, TableId, Value};
use strata_engine::{Output, Session, Statement, TransactionPhase};

/// A client connection.
///
/// Dropping the connection closes it; an open transaction is rolled back.
#[derive(Debug)]
pub struct Connection {
    session: Session,
}

impl Connection {
    pub(crate) fn new(session: Session) -> Self {
        Self { session }
    }

    /// Session identifier, usable with [`crate::Strata::close_session`].
    pub fn id(&self) -> SessionId {
        self.session.id()
    }

    /// Execute a statement.
    pub fn execute(&mut self, statement: &Statement) -> Result<Output> {
        Ok(self.session.execute(statement)?)
    }

    /// Read every row of `table`.
    pub fn query(&mut self, table: impl Into<TableId>) -> Result<Vec<Row>> {
        Ok(self.session.query(table)?)
    }

    /// Read `table` and return its value if it holds exactly one row of one column.
    pub fn query_single(&mut self, table: impl Into<TableId>) -> Result<Option<Value>> {
        let rows = self.query(table)?;
        Ok(Output::Rows(rows).single_value().cloned())
    }

    /// Run a configuration command (`SET LOCK_MODE n`, `CALL LOCK_MODE()`, `SET LOCK_TIMEOUT ms`).
    pub fn execute_command(&mut self, command: &str) -> Result<Output> {
        Ok(self.session.execute_command(command)?)
    }

    /// Commit the current transaction.
    pub fn commit(&mut self) -> Result<()> {
        Ok(self.session.commit()?)
    }

    /// Roll back the current transaction.
    pub fn rollback(&mut self) -> Result<()> {
        Ok(self.session.rollback()?)
    }

    /// Enable or disable autocommit; enabling commits an open transaction.
    pub fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        Ok(self.session.set_autocommit(auto_commit)?)
    }

    /// Whether autocommit is enabled.
    pub fn auto_commit(&self) -> bool {
        self.session.autocommit()
    }

    /// Set the isolation level. This changes the lock mode for every connection.
    pub fn set_transaction_isolation(&mut self, level: IsolationLevel) -> Result<()> {
        Ok(self.session.set_transaction_isolation(level)?)
    }

    /// Set the isolation level from its integer code (1, 2 or 8).
    pub fn set_transaction_isolation_code(&mut self, code: i32) -> Result<()> {
        let level = IsolationLevel::from_i32(code)?;
        self.set_transaction_isolation(level)
    }

    /// Isolation level implied by the current lock mode.
    pub fn transaction_isolation(&mut self) -> Result<IsolationLevel> {
        Ok(self.session.transaction_isolation()?)
    }

    /// Current system-wide lock mode.
    pub fn lock_mode(&self) -> LockMode {
        self.session.lock_mode()
    }

    /// Table locks this connection holds.
    pub fn locks(&self) -> Vec<(TableId, LockKind)> {
        self.session.locks()
    }

    /// Transaction phase.
    pub fn phase(&self) -> TransactionPhase {
        self.session.phase()
    }

    /// Check if the connection is closed.
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// Close the connection, rolling back any open transaction.
    pub fn close(&mut self) {
        self.session.close();
    }
}
