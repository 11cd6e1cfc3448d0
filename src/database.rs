//! Main database entry point.
//!
//! This module provides the `Strata` struct, the handle every connection is
//! opened from.

use crate::connection::Connection;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use strata_concurrency::LockSnapshot;
use strata_core::{LockConfig, LockMode, SessionId, TableId};

/// The database.
///
/// Cloning is cheap: every clone shares the same tables, locks and sessions.
///
/// # Example
///
/// ```ignore
/// use strata_locking::prelude::*;
///
/// let db = Strata::builder()
///     .lock_timeout(Duration::from_millis(200))
///     .open();
///
/// let mut conn = db.connect();
/// conn.execute(&Statement::create_table("test", ["id"]))?;
/// ```
#[derive(Debug, Clone)]
pub struct Strata {
    inner: Arc<strata_engine::Database>,
}

impl Strata {
    /// Open a database with default settings.
    ///
    /// Lock mode READ_COMMITTED (3), lock timeout 1000 ms.
    pub fn open() -> Self {
        Self::builder().open()
    }

    /// Create a builder for database configuration.
    pub fn builder() -> StrataBuilder {
        StrataBuilder::new()
    }

    /// Open a new connection.
    pub fn connect(&self) -> Connection {
        Connection::new(self.inner.connect())
    }

    /// Close a connection from another thread.
    ///
    /// A lock wait in progress on that connection fails with a lock timeout.
    /// Its transaction is rolled back and its locks released before this
    /// returns. Returns `false` if no such connection is open.
    pub fn close_session(&self, session: SessionId) -> bool {
        self.inner.close_session(session)
    }

    /// Number of open connections.
    pub fn session_count(&self) -> usize {
        self.inner.session_count()
    }

    /// Current system-wide lock mode.
    pub fn lock_mode(&self) -> LockMode {
        self.inner.lock_mode()
    }

    /// Change the system-wide lock mode.
    pub fn set_lock_mode(&self, mode: LockMode) {
        self.inner.set_lock_mode(mode);
    }

    /// Current lock wait bound.
    pub fn lock_timeout(&self) -> Duration {
        self.inner.lock_timeout()
    }

    /// Holders and waiters of a table's lock.
    pub fn holders(&self, table: impl Into<TableId>) -> LockSnapshot {
        self.inner.lock_manager().holders(&table.into())
    }

    /// Configuration the database was opened with.
    pub fn config(&self) -> &LockConfig {
        self.inner.config()
    }
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// let db = Strata::builder()
///     .config_toml("lock_timeout_ms = 250\ndefault_lock_mode = 1")?
///     .open();
/// ```
#[derive(Debug, Clone, Default)]
pub struct StrataBuilder {
    inner: strata_engine::DatabaseBuilder,
}

impl StrataBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how long a blocked lock request waits before timing out.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.lock_timeout(timeout);
        self
    }

    /// Set the initial lock mode.
    pub fn lock_mode(mut self, mode: LockMode) -> Self {
        self.inner = self.inner.lock_mode(mode);
        self
    }

    /// Use a complete configuration.
    pub fn config(mut self, config: LockConfig) -> Self {
        self.inner = self.inner.config(config);
        self
    }

    /// Load the configuration from a TOML document.
    pub fn config_toml(self, input: &str) -> Result<Self> {
        let config = LockConfig::from_toml_str(input)?;
        Ok(self.config(config))
    }

    /// Open the database.
    pub fn open(self) -> Strata {
        Strata {
            inner: Arc::new(self.inner.open()),
        }
    }
}
