//! Isolation Integration Tests
//!
//! Two or more connections against one database: which statements block,
//! which succeed, which fail with a lock timeout, and what each reader sees.

#[path = "../common/mod.rs"]
mod common;

mod cancellation;
mod lock_mode;
mod read_committed;
mod serializable;
mod walkthrough;
