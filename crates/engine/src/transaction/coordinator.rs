//! Statement-level orchestration of locking, execution and transaction end
//!
//! For every statement the coordinator:
//!
//! 1. Opens a transaction if the session is idle, capturing the current lock mode
//! 2. Asks [`IsolationPolicy`] which lock each touched table needs and acquires it
//! 3. Executes the statement against the [`TableStore`], logging the inverse
//!    of every row it writes
//! 4. Drops read locks if the mode releases them per statement
//! 5. Commits or rolls back when the session is in autocommit
//!
//! A failed statement inside an explicit transaction leaves the transaction
//! open with every lock it already held. Rolling back is the caller's call.

use super::{Transaction, TransactionPhase};
use crate::statement::{Output, Statement};
use crate::storage::TableStore;
use std::sync::Arc;
use strata_concurrency::{IsolationPolicy, LockManager, StatementKind};
use strata_core::error::{Error, Result};
use strata_core::{LockMode, TableId};
use tracing::debug;

/// Drives session transactions through the lock manager and table store
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    locks: Arc<LockManager>,
    store: Arc<TableStore>,
}

impl TransactionCoordinator {
    /// Create a coordinator over a shared lock manager and store
    pub fn new(locks: Arc<LockManager>, store: Arc<TableStore>) -> Self {
        Self { locks, store }
    }

    /// Lock manager used for every acquisition and release
    pub fn lock_manager(&self) -> &Arc<LockManager> {
        &self.locks
    }

    /// Table store statements run against
    pub fn store(&self) -> &Arc<TableStore> {
        &self.store
    }

    /// Execute `statement` within `txn`
    ///
    /// With `autocommit`, the statement forms its own transaction: committed
    /// on success, rolled back on failure.
    pub fn execute(
        &self,
        txn: &mut Transaction,
        statement: &Statement,
        autocommit: bool,
    ) -> Result<Output> {
        if let Statement::CreateTable { table, columns } = statement {
            self.store.create_table(table, columns)?;
            debug!(session = %txn.session, table = %table, "Created table");
            return Ok(Output::Unit);
        }

        let table = statement.table();
        if !self.store.contains(table) {
            return Err(Error::TableNotFound {
                table: table.clone(),
            });
        }

        let result = self
            .begin_statement(txn, &statement.table_access())
            .and_then(|()| self.apply(txn, statement));
        self.end_statement(txn, autocommit, result.is_ok());
        result
    }

    /// Open a transaction if needed and acquire the locks `access` requires
    ///
    /// On failure, locks acquired for earlier tables of the same statement
    /// stay held until the transaction ends.
    pub fn begin_statement(
        &self,
        txn: &mut Transaction,
        access: &[(TableId, StatementKind)],
    ) -> Result<()> {
        let mode = self.ensure_active(txn);
        for (table, kind) in access {
            if let Some(lock) = IsolationPolicy::lock_for(mode, *kind) {
                self.locks.acquire(table, txn.session, lock)?;
            }
        }
        Ok(())
    }

    /// Release per-statement read locks and finish autocommit transactions
    pub fn end_statement(&self, txn: &mut Transaction, autocommit: bool, succeeded: bool) {
        if !txn.is_active() {
            return;
        }
        let mode = txn.mode.unwrap_or_else(|| self.locks.lock_mode());
        if IsolationPolicy::releases_reads_after_statement(mode) {
            self.locks.release_read_locks(txn.session);
        }
        if autocommit {
            if succeeded {
                self.commit(txn);
            } else {
                self.rollback(txn);
            }
        }
    }

    /// Commit: keep every write, release every lock
    ///
    /// Always releases, even if the transaction never took a lock.
    pub fn commit(&self, txn: &mut Transaction) {
        txn.phase = TransactionPhase::Committing;
        let writes = txn.undo.len();
        txn.undo.clear();
        let released = self.locks.release_all(txn.session);
        debug!(session = %txn.session, writes, released, "Committed");
        self.finish(txn);
    }

    /// Roll back: reverse this transaction's row writes, then release every lock
    pub fn rollback(&self, txn: &mut Transaction) {
        txn.phase = TransactionPhase::RollingBack;
        let restored = txn.undo.apply(&self.store);
        let released = self.locks.release_all(txn.session);
        debug!(session = %txn.session, restored, released, "Rolled back");
        self.finish(txn);
    }

    fn ensure_active(&self, txn: &mut Transaction) -> LockMode {
        if let Some(mode) = txn.mode.filter(|_| txn.is_active()) {
            return mode;
        }
        let mode = self.locks.lock_mode();
        txn.phase = TransactionPhase::InTransaction;
        txn.mode = Some(mode);
        debug!(session = %txn.session, mode = %mode, "Transaction started");
        mode
    }

    fn apply(&self, txn: &mut Transaction, statement: &Statement) -> Result<Output> {
        match statement {
            Statement::Select { table } => Ok(Output::Rows(self.store.rows(table)?)),
            Statement::Insert { table, values } => {
                let row = self.store.insert(table, values.clone())?;
                txn.undo.record_insert(table, row);
                Ok(Output::Affected(1))
            }
            Statement::Update {
                table,
                column,
                value,
            } => {
                let updated = self.store.update_all(table, column, value)?;
                let affected = updated.previous.len() as u64;
                txn.undo.record_update(table, updated);
                Ok(Output::Affected(affected))
            }
            Statement::Delete { table } => {
                let removed = self.store.delete_all(table)?;
                let affected = removed.len() as u64;
                txn.undo.record_delete(table, removed);
                Ok(Output::Affected(affected))
            }
            Statement::CreateTable { table, columns } => {
                self.store.create_table(table, columns)?;
                Ok(Output::Unit)
            }
        }
    }

    fn finish(&self, txn: &mut Transaction) {
        txn.phase = TransactionPhase::Idle;
        txn.mode = None;
    }
}
