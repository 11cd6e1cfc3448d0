//! Core types for the Strata table lock manager
//!
//! This crate defines the vocabulary shared by every layer:
//! - [`SessionId`] and [`TableId`]: what is locked and by whom
//! - [`LockKind`]: Shared / Exclusive
//! - [`LockMode`] and [`IsolationLevel`]: the system mechanism and its session view
//! - [`Value`] and [`Row`]: cell data held by the in-memory table store
//! - [`Error`]: the tagged error enumeration surfaced to callers
//! - [`LockConfig`]: lock timeout and default lock mode

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod mode;
pub mod types;
pub mod value;

pub use config::LockConfig;
pub use error::{Error, Result};
pub use mode::{IsolationLevel, LockMode};
pub use types::{LockKind, SessionId, TableId};
pub use value::{Row, Value};
