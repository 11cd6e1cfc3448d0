//! Database: shared state behind every session
//!
//! A [`Database`] owns the lock manager, the table store and the registry of
//! open sessions. Sessions hold an `Arc<Database>`; the lock mode lives in
//! the lock manager, so every session observes a change immediately.
//!
//! # Example
//!
//! ```ignore
//! let db = Arc::new(Database::builder().lock_timeout(Duration::from_millis(200)).open());
//! let mut session = db.connect();
//! session.execute(&Statement::create_table("test", ["id"]))?;
//! ```

use crate::session::{Session, SessionHandle};
use crate::storage::TableStore;
use crate::transaction::TransactionCoordinator;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strata_concurrency::LockManager;
use strata_core::{LockConfig, LockMode, SessionId};
use tracing::{debug, info};

/// Shared engine state
pub struct Database {
    config: LockConfig,
    coordinator: TransactionCoordinator,
    /// Open sessions, reachable for external close
    sessions: DashMap<SessionId, Arc<SessionHandle>>,
    next_session: AtomicU64,
}

impl Database {
    /// Open an empty database with the given configuration
    pub fn new(config: LockConfig) -> Self {
        let locks = Arc::new(LockManager::new(&config));
        let store = Arc::new(TableStore::new());
        info!(
            lock_mode = %config.default_lock_mode,
            lock_timeout_ms = config.lock_timeout.as_millis() as u64,
            "Database opened"
        );
        Self {
            config,
            coordinator: TransactionCoordinator::new(locks, store),
            sessions: DashMap::new(),
            next_session: AtomicU64::new(1),
        }
    }

    /// Builder for configuring a database
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Open a new session
    pub fn connect(self: &Arc<Self>) -> Session {
        let id = SessionId::new(self.next_session.fetch_add(1, Ordering::Relaxed));
        let handle = Arc::new(SessionHandle::new(id));
        self.sessions.insert(id, Arc::clone(&handle));
        debug!(session = %id, "Session opened");
        Session::new(id, Arc::clone(self), handle)
    }

    /// Close a session from outside its own thread
    ///
    /// A lock wait in progress fails with `SessionClosedWhileWaiting`. The
    /// session's transaction is rolled back and all of its locks released
    /// before this returns; a statement still running on the owner thread
    /// is allowed to finish first. Every later call on the session fails
    /// with `SessionClosed`. Returns `false` if no such session is open.
    pub fn close_session(&self, session: SessionId) -> bool {
        let Some(handle) = self.interrupt(session) else {
            return false;
        };
        let mut txn = handle.transaction().lock();
        self.coordinator.rollback(&mut *txn);
        drop(txn);
        self.deregister(session);
        info!(session = %session, "Session closed externally");
        true
    }

    /// Number of open sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Current system-wide lock mode
    pub fn lock_mode(&self) -> LockMode {
        self.coordinator.lock_manager().lock_mode()
    }

    /// Change the system-wide lock mode
    ///
    /// Locks already held are unaffected; open transactions keep the mode
    /// they started with.
    pub fn set_lock_mode(&self, mode: LockMode) {
        self.coordinator.lock_manager().set_lock_mode(mode);
    }

    /// Current lock wait bound
    pub fn lock_timeout(&self) -> Duration {
        self.coordinator.lock_manager().lock_timeout()
    }

    /// Change the lock wait bound for subsequent requests
    pub fn set_lock_timeout(&self, timeout: Duration) {
        self.coordinator.lock_manager().set_lock_timeout(timeout);
    }

    /// Configuration the database was opened with
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Lock manager shared by every session
    pub fn lock_manager(&self) -> &Arc<LockManager> {
        self.coordinator.lock_manager()
    }

    /// Table store shared by every session
    pub fn store(&self) -> &Arc<TableStore> {
        self.coordinator.store()
    }

    pub(crate) fn coordinator(&self) -> &TransactionCoordinator {
        &self.coordinator
    }

    /// Flag `session` as closed and cancel its lock waits
    ///
    /// The registry entry stays borrowed across the cancel, so a concurrent
    /// [`deregister`](Self::deregister) either runs entirely before (and the
    /// session is not found) or clears the cancel mark afterwards.
    fn interrupt(&self, session: SessionId) -> Option<Arc<SessionHandle>> {
        let entry = self.sessions.get(&session)?;
        entry.interrupt();
        let woken = self.coordinator.lock_manager().cancel(session);
        debug!(session = %session, woken, "Session interrupted");
        Some(Arc::clone(entry.value()))
    }

    /// Remove `session` from the registry, then from the lock manager
    pub(crate) fn deregister(&self, session: SessionId) {
        if self.sessions.remove(&session).is_some() {
            debug!(session = %session, "Session closed");
        }
        self.coordinator.lock_manager().unregister(session);
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("lock_mode", &self.lock_mode())
            .field("lock_timeout", &self.lock_timeout())
            .field("sessions", &self.sessions.len())
            .field("tables", &self.store().table_count())
            .finish()
    }
}

/// Builder for [`Database`]
#[derive(Debug, Clone, Default)]
pub struct DatabaseBuilder {
    config: LockConfig,
}

impl DatabaseBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: LockConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how long a lock request may wait
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_lock_timeout(timeout);
        self
    }

    /// Set the initial lock mode
    pub fn lock_mode(mut self, mode: LockMode) -> Self {
        self.config = self.config.with_lock_mode(mode);
        self
    }

    /// Open the database
    pub fn open(self) -> Database {
        Database::new(self.config)
    }
}
