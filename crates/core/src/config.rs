//! Lock manager configuration
//!
//! [`LockConfig`] is owned by a database instance and threaded through the
//! lock manager and coordinator constructors; there is no process-global
//! setting.
//!
//! ```
//! use std::time::Duration;
//! use strata_core::{LockConfig, LockMode};
//!
//! let config = LockConfig::default()
//!     .with_lock_timeout(Duration::from_millis(250))
//!     .with_lock_mode(LockMode::SerializableTable);
//! assert_eq!(config.lock_timeout, Duration::from_millis(250));
//! ```
//!
//! Configuration may also be loaded from TOML:
//!
//! ```toml
//! lock_timeout_ms = 250
//! default_lock_mode = 1
//! ```

use crate::error::{Error, Result};
use crate::mode::LockMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default wait bound for a blocked lock request
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(1000);

/// Configuration for table locking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long a blocked lock request waits before failing with `LockTimeout`
    #[serde(rename = "lock_timeout_ms", with = "duration_ms")]
    pub lock_timeout: Duration,

    /// Lock mode active when the database opens
    pub default_lock_mode: LockMode,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            default_lock_mode: LockMode::default(),
        }
    }
}

impl LockConfig {
    /// Create a LockConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lock wait bound
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set the initial lock mode
    pub fn with_lock_mode(mut self, mode: LockMode) -> Self {
        self.default_lock_mode = mode;
        self
    }

    /// Parse configuration from a TOML document
    ///
    /// Missing keys take their default values. An unknown lock mode value
    /// is reported as `Error::Config`.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| Error::Config(e.to_string()))
    }

    /// Render configuration as a TOML document
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
