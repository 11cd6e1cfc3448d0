//! Concurrency layer for Strata
//!
//! This crate implements pessimistic table-level locking with:
//! - LockTable: per-table holders and FIFO wait queue
//! - LockManager: acquire / wait / upgrade / release across sessions
//! - IsolationPolicy: lock mode → per-statement locking behavior
//!
//! Liveness is timeout based: there is no deadlock graph, a cycle resolves
//! when one of its waiters times out.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lock_table;
pub mod manager;
pub mod policy;

pub use lock_table::{LockRequest, LockSnapshot, LockTable};
pub use manager::LockManager;
pub use policy::{IsolationPolicy, ReadLockRelease, StatementKind};
