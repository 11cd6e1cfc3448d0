//! Shared helpers for integration tests.

#![allow(dead_code)]

pub use std::sync::{Arc, Barrier};
pub use std::thread;
pub use std::time::Instant;
pub use strata_locking::prelude::*;

/// Wait bound for tests that expect a lock timeout
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(100);

/// Wait bound for tests that expect a blocked request to be granted
pub const LONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Install a test-writer subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A database holding `TEST(ID)` with a single row `1`
pub struct TestDb {
    pub db: Strata,
}

impl TestDb {
    /// Short lock timeout, default lock mode
    pub fn new() -> Self {
        Self::with_timeout(SHORT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        init_tracing();
        let db = Strata::builder().lock_timeout(timeout).open();
        let mut conn = db.connect();
        conn.execute(&Statement::create_table("test", ["id"])).unwrap();
        conn.execute(&Statement::insert("test", [1])).unwrap();
        Self { db }
    }

    pub fn connect(&self) -> Connection {
        self.db.connect()
    }

    /// Connection with autocommit off
    pub fn connect_manual(&self) -> Connection {
        let mut conn = self.db.connect();
        conn.set_auto_commit(false).unwrap();
        conn
    }

    /// Number of requests queued on `table`
    pub fn waiting_on(&self, table: &str) -> usize {
        self.db.holders(table).waiting.len()
    }

    /// Block until some request is queued on `table`
    pub fn wait_for_waiter(&self, table: &str) {
        wait_until(&format!("a waiter on {table}"), || self.waiting_on(table) > 0);
    }
}

/// Single value of `SELECT * FROM table`
pub fn single_value(conn: &mut Connection, table: &str) -> Value {
    conn.query_single(table)
        .unwrap()
        .unwrap_or_else(|| panic!("{table} does not hold exactly one value"))
}

/// Poll `cond` until it holds, failing the test after five seconds
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(2));
    }
}

/// Assert that `result` failed with a lock timeout
pub fn assert_lock_timeout<T: std::fmt::Debug>(result: Result<T>) -> Error {
    let err = result.expect_err("expected lock timeout");
    assert!(err.is_lock_timeout(), "expected lock timeout, got {err}");
    err
}
