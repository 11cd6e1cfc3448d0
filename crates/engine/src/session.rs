//! Sessions: one per client connection
//!
//! A session runs statements on behalf of one client, one at a time. Its
//! [`Transaction`] lives in a [`SessionHandle`] shared with the database's
//! session registry, so [`Database::close_session`] can roll it back from
//! another thread. Its locks are recorded by the lock manager, which is the
//! only place they are mutated.
//!
//! Dropping a session closes it, which rolls back any open transaction and
//! releases every lock it holds.

use crate::command::ConfigCommand;
use crate::database::Database;
use crate::statement::{Output, Statement};
use crate::transaction::{Transaction, TransactionPhase};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strata_concurrency::IsolationPolicy;
use strata_core::error::{Error, Result};
use strata_core::{IsolationLevel, LockKind, LockMode, Row, SessionId, TableId, Value};
use tracing::{debug, warn};

/// Session state shared between the session and the session registry
///
/// The transaction mutex is held for the whole of every statement, so an
/// external close waits for a running statement to finish (a lock wait is
/// cut short by cancelling it first) and never interleaves with it.
#[derive(Debug)]
pub(crate) struct SessionHandle {
    interrupted: AtomicBool,
    txn: Mutex<Transaction>,
}

impl SessionHandle {
    pub(crate) fn new(id: SessionId) -> Self {
        Self {
            interrupted: AtomicBool::new(false),
            txn: Mutex::new(Transaction::new(id)),
        }
    }

    pub(crate) fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    pub(crate) fn transaction(&self) -> &Mutex<Transaction> {
        &self.txn
    }
}

/// A client session
///
/// # Thread Safety
///
/// `Session` is `Send` but not shared: each session is driven by a single
/// thread. To interrupt a session from another thread use
/// [`Database::close_session`].
pub struct Session {
    id: SessionId,
    db: Arc<Database>,
    handle: Arc<SessionHandle>,
    autocommit: bool,
    closed: bool,
}

impl Session {
    pub(crate) fn new(id: SessionId, db: Arc<Database>, handle: Arc<SessionHandle>) -> Self {
        Self {
            id,
            db,
            handle,
            autocommit: true,
            closed: false,
        }
    }

    /// Session identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Database this session belongs to
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Execute a statement
    ///
    /// A `LockTimeout` aborts only this statement. In an explicit transaction
    /// every lock taken by earlier statements is still held afterwards.
    pub fn execute(&mut self, statement: &Statement) -> Result<Output> {
        let autocommit = self.autocommit;
        self.with_transaction(|session, txn| {
            session
                .db
                .coordinator()
                .execute(txn, statement, autocommit)
        })
    }

    /// `SELECT * FROM table`, returning its rows
    pub fn query(&mut self, table: impl Into<TableId>) -> Result<Vec<Row>> {
        let output = self.execute(&Statement::select(table))?;
        Ok(output.into_rows().unwrap_or_default())
    }

    /// Run a configuration command such as `SET LOCK_MODE 1` or `CALL LOCK_MODE()`
    ///
    /// Commands are not transactional and take no table locks.
    pub fn execute_command(&mut self, command: &str) -> Result<Output> {
        self.with_transaction(|session, _| {
            let command: ConfigCommand = command.parse()?;
            debug!(session = %session.id, %command, "Config command");
            Ok(match command {
                ConfigCommand::SetLockMode(mode) => {
                    session.db.set_lock_mode(mode);
                    Output::Unit
                }
                ConfigCommand::QueryLockMode => {
                    Output::Value(Value::Int(i64::from(session.db.lock_mode().as_i32())))
                }
                ConfigCommand::SetLockTimeout(timeout) => {
                    session.db.set_lock_timeout(timeout);
                    Output::Unit
                }
            })
        })
    }

    /// Commit the current transaction and release every lock
    pub fn commit(&mut self) -> Result<()> {
        self.with_transaction(|session, txn| {
            session.db.coordinator().commit(txn);
            Ok(())
        })
    }

    /// Undo the current transaction's writes and release every lock
    pub fn rollback(&mut self) -> Result<()> {
        self.with_transaction(|session, txn| {
            session.db.coordinator().rollback(txn);
            Ok(())
        })
    }

    /// Switch autocommit on or off
    ///
    /// Turning autocommit on commits an open transaction.
    pub fn set_autocommit(&mut self, autocommit: bool) -> Result<()> {
        let was = self.autocommit;
        self.with_transaction(|session, txn| {
            if autocommit && !was && txn.is_active() {
                session.db.coordinator().commit(txn);
            }
            Ok(())
        })?;
        self.autocommit = autocommit;
        Ok(())
    }

    /// Whether each statement commits on its own
    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    /// Set the isolation level, which sets the system lock mode it maps to
    pub fn set_transaction_isolation(&mut self, level: IsolationLevel) -> Result<()> {
        self.with_transaction(|session, _| {
            let mode = IsolationPolicy::lock_mode_for(level);
            debug!(session = %session.id, %level, %mode, "Isolation level set");
            session.db.set_lock_mode(mode);
            Ok(())
        })
    }

    /// Isolation level implied by the current lock mode
    ///
    /// Reflects lock mode changes made through configuration commands or by
    /// other sessions.
    pub fn transaction_isolation(&mut self) -> Result<IsolationLevel> {
        self.with_transaction(|session, _| {
            Ok(IsolationPolicy::isolation_level_for(session.db.lock_mode()))
        })
    }

    /// Current system-wide lock mode
    pub fn lock_mode(&self) -> LockMode {
        self.db.lock_mode()
    }

    /// Locks this session holds, sorted by table
    pub fn locks(&self) -> Vec<(TableId, LockKind)> {
        self.db.lock_manager().locks_held(self.id)
    }

    /// Transaction phase
    pub fn phase(&self) -> TransactionPhase {
        self.handle.transaction().lock().phase()
    }

    /// Check if the session has been closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the session, rolling back any open transaction
    ///
    /// Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let handle = Arc::clone(&self.handle);
        let mut txn = handle.transaction().lock();
        self.shutdown(&mut *txn);
    }

    /// Run `f` on the open transaction
    ///
    /// Fails with `SessionClosed` once the session is closed, including by
    /// [`Database::close_session`]. A lock wait cut short by an external
    /// close shuts the session down before the error is returned.
    fn with_transaction<R>(
        &mut self,
        f: impl FnOnce(&Self, &mut Transaction) -> Result<R>,
    ) -> Result<R> {
        let handle = Arc::clone(&self.handle);
        let mut txn = handle.transaction().lock();
        if !self.closed && handle.is_interrupted() {
            warn!(session = %self.id, "Session was closed externally");
            self.shutdown(&mut *txn);
        }
        if self.closed {
            return Err(Error::SessionClosed { session: self.id });
        }

        let result = f(self, &mut *txn);
        if let Err(Error::SessionClosedWhileWaiting { .. }) = &result {
            self.shutdown(&mut *txn);
        }
        result
    }

    fn shutdown(&mut self, txn: &mut Transaction) {
        if txn.phase() != TransactionPhase::Idle {
            debug!(session = %self.id, "Rolling back open transaction on close");
        }
        self.db.coordinator().rollback(txn);
        self.db.deregister(self.id);
        self.closed = true;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = self.handle.transaction().try_lock().map(|txn| txn.phase());
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("phase", &phase)
            .field("autocommit", &self.autocommit)
            .field("closed", &self.closed)
            .finish()
    }
}
