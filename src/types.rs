//! Public types re-exported from the internal crates.

// Identifiers and lock vocabulary
pub use strata_core::{IsolationLevel, LockConfig, LockKind, LockMode, SessionId, TableId};

// Cell data
pub use strata_core::{Row, Value};

// Statements and their results
pub use strata_engine::{Output, Statement, TransactionPhase};

// Lock introspection
pub use strata_concurrency::LockSnapshot;
