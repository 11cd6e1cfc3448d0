//! Lock manager for coordinating table locks across sessions
//!
//! Provides blocking lock acquisition by orchestrating:
//! 1. Immediate grant (compatible and nobody queued ahead)
//! 2. FIFO queueing on the table's wait queue
//! 3. Wakeup on release, timeout, or cancellation
//!
//! ## Acquire Sequence
//!
//! ```text
//! 1. Lock manager state
//! 2. IF session already holds a covering lock: return Ok
//! 3. IF compatible AND (queue empty OR upgrade): grant, return Ok
//! 4. Enqueue request with a fresh ticket
//! 5. Wait on condvar until ticket is Granted / Cancelled or deadline passes
//! 6. On timeout: dequeue, re-dispatch the table, return LockTimeout
//! ```
//!
//! Every release path (`release_all`, `release_read_locks`, timeout,
//! cancellation) re-dispatches the affected table's queue before the state
//! lock is dropped, so a release and the grants it enables are atomic with
//! respect to new `acquire` calls.

use crate::lock_table::{LockRequest, LockSnapshot, LockTable};
use parking_lot::{Condvar, Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use std::time::{Duration, Instant};
use strata_core::error::{Error, Result};
use strata_core::{LockConfig, LockKind, LockMode, SessionId, TableId};
use tracing::{debug, info, warn};

/// Outcome of a queued request, written by whoever resolves it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TicketState {
    Waiting,
    Granted,
    Cancelled,
}

/// Everything protected by the manager's critical section
#[derive(Debug, Default)]
struct LockState {
    /// Per-table holders and wait queues; idle tables are dropped
    tables: FxHashMap<TableId, LockTable>,
    /// Per-session lock set, kept in lockstep with `tables`
    sessions: FxHashMap<SessionId, FxHashMap<TableId, LockKind>>,
    /// Resolution of every queued request
    tickets: FxHashMap<u64, TicketState>,
    /// Sessions closed from outside; further requests fail immediately
    cancelled: FxHashSet<SessionId>,
    next_ticket: u64,
}

impl LockState {
    fn record(&mut self, session: SessionId, table: &TableId, kind: LockKind) {
        self.sessions
            .entry(session)
            .or_default()
            .insert(table.clone(), kind);
    }

    fn forget(&mut self, session: SessionId, table: &TableId) {
        if let Some(locks) = self.sessions.get_mut(&session) {
            locks.remove(table);
            if locks.is_empty() {
                self.sessions.remove(&session);
            }
        }
    }

    /// Grant whatever the table's queue allows and resolve those tickets
    ///
    /// Returns the number of requests granted.
    fn dispatch(&mut self, table: &TableId) -> usize {
        let granted: Vec<LockRequest> = match self.tables.get_mut(table) {
            Some(lock_table) => lock_table.grant_waiters(),
            None => return 0,
        };
        for request in &granted {
            let kind = self
                .tables
                .get(table)
                .and_then(|t| t.held_by(request.session))
                .unwrap_or(request.kind);
            self.record(request.session, table, kind);
            self.tickets.insert(request.ticket, TicketState::Granted);
            debug!(
                table = %table,
                session = %request.session,
                kind = %kind,
                "Granted queued lock"
            );
        }
        self.drop_if_idle(table);
        granted.len()
    }

    fn drop_if_idle(&mut self, table: &TableId) {
        if self.tables.get(table).map_or(false, LockTable::is_idle) {
            self.tables.remove(table);
        }
    }
}

/// Manages table locks for every session of a database
///
/// LockManager is the central policy engine for pessimistic table locking:
/// - Shared locks coexist; an Exclusive lock excludes every other lock
/// - Blocked requests queue FIFO per table and wait up to the lock timeout
/// - Commit/rollback release everything; read-committed statements release
///   their Shared locks as soon as they finish
///
/// The manager also owns the database's current [`LockMode`]. It is instance
/// state, not a global: two managers never influence each other.
///
/// # Thread Safety
///
/// All acquire/release/upgrade operations are serialized by one internal
/// mutex. Waiters park on a condvar and re-check their ticket on every
/// wakeup, so a grant can never be missed.
///
/// # Example
///
/// ```
/// use strata_concurrency::LockManager;
/// use strata_core::{LockConfig, LockKind, SessionId, TableId};
///
/// let manager = LockManager::new(&LockConfig::default());
/// let table = TableId::new("test");
/// let s1 = SessionId::new(1);
///
/// manager.acquire(&table, s1, LockKind::Exclusive).unwrap();
/// assert_eq!(manager.locks_held(s1), vec![(table.clone(), LockKind::Exclusive)]);
///
/// manager.release_all(s1);
/// assert!(manager.locks_held(s1).is_empty());
/// ```
pub struct LockManager {
    state: Mutex<LockState>,
    /// Signalled whenever a ticket leaves the Waiting state
    wakeup: Condvar,
    /// Current system-wide lock mode
    mode: RwLock<LockMode>,
    /// Wait bound for blocked requests
    timeout: RwLock<Duration>,
}

impl LockManager {
    /// Create a lock manager from configuration
    pub fn new(config: &LockConfig) -> Self {
        LockManager {
            state: Mutex::new(LockState::default()),
            wakeup: Condvar::new(),
            mode: RwLock::new(config.default_lock_mode),
            timeout: RwLock::new(config.lock_timeout),
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Current lock mode
    pub fn lock_mode(&self) -> LockMode {
        *self.mode.read()
    }

    /// Change the system-wide lock mode
    ///
    /// Takes effect for transactions started afterwards. Locks already
    /// granted are not touched.
    pub fn set_lock_mode(&self, mode: LockMode) {
        let previous = std::mem::replace(&mut *self.mode.write(), mode);
        if previous != mode {
            info!(from = %previous, to = %mode, "Lock mode changed");
        }
    }

    /// Current wait bound for blocked requests
    pub fn lock_timeout(&self) -> Duration {
        *self.timeout.read()
    }

    /// Change the wait bound; applies to requests that start waiting afterwards
    pub fn set_lock_timeout(&self, timeout: Duration) {
        *self.timeout.write() = timeout;
        debug!(timeout_ms = timeout.as_millis() as u64, "Lock timeout changed");
    }

    // ========================================================================
    // Acquire / Release
    // ========================================================================

    /// Acquire a lock of `kind` on `table` for `session`, blocking if needed
    ///
    /// - Shared: granted unless another session holds Exclusive
    /// - Exclusive: granted if no other session holds anything; a sole
    ///   Shared holder is upgraded in place
    /// - A request already covered by the session's lock returns at once
    /// - A session holding nothing on the table queues behind any existing
    ///   waiter, even if it would be compatible
    ///
    /// # Errors
    ///
    /// - `Error::LockTimeout` if the request is not granted within the lock
    ///   timeout; the request is withdrawn and nothing is granted
    /// - `Error::SessionClosedWhileWaiting` if the session is cancelled
    ///   while queued (or was already cancelled)
    ///
    /// Locks held before the call are never affected by a failure.
    pub fn acquire(&self, table: &TableId, session: SessionId, kind: LockKind) -> Result<()> {
        let mut state = self.state.lock();

        if state.cancelled.contains(&session) {
            return Err(Error::SessionClosedWhileWaiting {
                table: table.clone(),
                session,
            });
        }

        let lock_table = state.tables.entry(table.clone()).or_default();
        let held = lock_table.held_by(session);
        if held.map_or(false, |h| h.covers(kind)) {
            return Ok(());
        }

        let may_bypass_queue = held.is_some() || !lock_table.has_waiters();
        if may_bypass_queue && lock_table.is_compatible(session, kind) {
            lock_table.grant(session, kind);
            state.record(session, table, kind);
            debug!(table = %table, session = %session, kind = %kind, upgrade = held.is_some(), "Granted lock");
            return Ok(());
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        if let Some(lock_table) = state.tables.get_mut(table) {
            lock_table.enqueue(LockRequest {
                ticket,
                session,
                kind,
            });
        }
        state.tickets.insert(ticket, TicketState::Waiting);
        debug!(table = %table, session = %session, kind = %kind, ticket, "Lock request queued");

        let started = Instant::now();
        let deadline = started + self.lock_timeout();

        loop {
            match state.tickets.get(&ticket).copied() {
                Some(TicketState::Granted) => {
                    state.tickets.remove(&ticket);
                    return Ok(());
                }
                Some(TicketState::Cancelled) | None => {
                    state.tickets.remove(&ticket);
                    warn!(table = %table, session = %session, "Lock wait cancelled: session closed");
                    return Err(Error::SessionClosedWhileWaiting {
                        table: table.clone(),
                        session,
                    });
                }
                Some(TicketState::Waiting) => {}
            }

            if self.wakeup.wait_until(&mut state, deadline).timed_out() {
                // A grant or cancel may have landed right at the deadline
                if state.tickets.get(&ticket) != Some(&TicketState::Waiting) {
                    continue;
                }
                state.tickets.remove(&ticket);
                if let Some(lock_table) = state.tables.get_mut(table) {
                    lock_table.remove_request(ticket);
                }
                if state.dispatch(table) > 0 {
                    self.wakeup.notify_all();
                }
                let waited = started.elapsed();
                warn!(
                    table = %table,
                    session = %session,
                    kind = %kind,
                    waited_ms = waited.as_millis() as u64,
                    "Lock timeout"
                );
                return Err(Error::LockTimeout {
                    table: table.clone(),
                    session,
                    waited,
                });
            }
        }
    }

    /// Try to acquire without waiting
    ///
    /// Returns `Ok(true)` if the lock is held after the call and `Ok(false)`
    /// if the request would have to queue. Nothing is enqueued.
    pub fn try_acquire(&self, table: &TableId, session: SessionId, kind: LockKind) -> Result<bool> {
        let mut state = self.state.lock();
        if state.cancelled.contains(&session) {
            return Err(Error::SessionClosed { session });
        }
        let lock_table = state.tables.entry(table.clone()).or_default();
        let held = lock_table.held_by(session);
        if held.map_or(false, |h| h.covers(kind)) {
            return Ok(true);
        }
        let may_bypass_queue = held.is_some() || !lock_table.has_waiters();
        if may_bypass_queue && lock_table.is_compatible(session, kind) {
            lock_table.grant(session, kind);
            state.record(session, table, kind);
            return Ok(true);
        }
        state.drop_if_idle(table);
        Ok(false)
    }

    /// Release every Shared lock held by `session`
    ///
    /// Used after a statement completes under read-committed locking.
    /// Exclusive locks are kept, and so is a Shared lock the session is
    /// currently waiting to upgrade. Returns the number of locks released.
    pub fn release_read_locks(&self, session: SessionId) -> usize {
        let mut state = self.state.lock();

        let shared: Vec<TableId> = match state.sessions.get(&session) {
            Some(locks) => locks
                .iter()
                .filter(|(_, kind)| **kind == LockKind::Shared)
                .map(|(table, _)| table.clone())
                .collect(),
            None => return 0,
        };

        let mut released = 0;
        let mut granted = 0;
        for table in &shared {
            let Some(lock_table) = state.tables.get_mut(table) else {
                continue;
            };
            if lock_table.is_waiting(session) || !lock_table.release_shared(session) {
                continue;
            }
            released += 1;
            state.forget(session, table);
            granted += state.dispatch(table);
        }

        if granted > 0 {
            self.wakeup.notify_all();
        }
        if released > 0 {
            debug!(session = %session, released, "Released read locks");
        }
        released
    }

    /// Release every lock held by `session`
    ///
    /// Invoked on commit, rollback and session close. Queued waiters on the
    /// affected tables are granted in FIFO order before this returns.
    /// Calling it for a session that holds nothing is a no-op.
    pub fn release_all(&self, session: SessionId) -> usize {
        let mut state = self.state.lock();

        let Some(locks) = state.sessions.remove(&session) else {
            return 0;
        };

        let mut granted = 0;
        for table in locks.keys() {
            if let Some(lock_table) = state.tables.get_mut(table) {
                lock_table.release(session);
            }
            granted += state.dispatch(table);
        }

        if granted > 0 {
            self.wakeup.notify_all();
        }
        debug!(session = %session, released = locks.len(), granted, "Released all locks");
        locks.len()
    }

    /// Cancel `session` from outside its own thread
    ///
    /// Any request the session has queued is withdrawn and its waiter wakes
    /// with `SessionClosedWhileWaiting`; every later request by the session
    /// fails the same way until [`unregister`](Self::unregister). Locks the
    /// session holds are left for the caller to release once the session's
    /// writes are undone. Returns the number of waits cancelled.
    pub fn cancel(&self, session: SessionId) -> usize {
        let mut state = self.state.lock();
        state.cancelled.insert(session);

        let mut cancelled = Vec::new();
        for (table, lock_table) in state.tables.iter_mut() {
            for ticket in lock_table.tickets_of(session) {
                lock_table.remove_request(ticket);
                cancelled.push((table.clone(), ticket));
            }
        }

        for (table, ticket) in &cancelled {
            state.tickets.insert(*ticket, TicketState::Cancelled);
            state.dispatch(table);
        }

        if !cancelled.is_empty() {
            self.wakeup.notify_all();
            warn!(session = %session, waits = cancelled.len(), "Cancelled queued lock requests");
        }
        cancelled.len()
    }

    /// Forget `session` entirely: release its locks and clear its cancel mark
    pub fn unregister(&self, session: SessionId) {
        self.release_all(session);
        self.state.lock().cancelled.remove(&session);
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Locks held by `session`, ordered by table
    pub fn locks_held(&self, session: SessionId) -> Vec<(TableId, LockKind)> {
        let state = self.state.lock();
        let mut locks: Vec<_> = state
            .sessions
            .get(&session)
            .map(|locks| locks.iter().map(|(t, k)| (t.clone(), *k)).collect())
            .unwrap_or_default();
        locks.sort_by(|a, b| a.0.cmp(&b.0));
        locks
    }

    /// Holders and waiters of `table`
    pub fn holders(&self, table: &TableId) -> LockSnapshot {
        let state = self.state.lock();
        state
            .tables
            .get(table)
            .map(LockTable::snapshot)
            .unwrap_or_default()
    }

    /// Check if `session` has a request queued on any table
    pub fn is_waiting(&self, session: SessionId) -> bool {
        let state = self.state.lock();
        state.tables.values().any(|t| t.is_waiting(session))
    }

    /// Number of tables with at least one holder or waiter
    pub fn locked_table_count(&self) -> usize {
        self.state.lock().tables.len()
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(&LockConfig::default())
    }
}

impl std::fmt::Debug for LockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockManager")
            .field("mode", &self.lock_mode())
            .field("timeout", &self.lock_timeout())
            .field("locked_tables", &self.locked_table_count())
            .finish()
    }
}
