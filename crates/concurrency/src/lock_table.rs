//! Per-table lock state
//!
//! A [`LockTable`] records who holds a table and who is waiting for it:
//! - a set of Shared holders
//! - an optional Exclusive holder
//! - a FIFO queue of blocked requests
//!
//! It is plain data with no synchronization of its own; the
//! [`LockManager`](crate::LockManager) serializes every access.
//!
//! # Invariants
//!
//! - At most one Exclusive holder
//! - An Exclusive holder excludes every Shared holder
//! - A session appears at most once among the holders

use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use strata_core::{LockKind, SessionId};

/// A blocked lock request waiting in a table's queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRequest {
    /// Manager-wide ticket identifying the waiter
    pub ticket: u64,
    /// Requesting session
    pub session: SessionId,
    /// Requested lock kind
    pub kind: LockKind,
}

/// Point-in-time view of a table's lock state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockSnapshot {
    /// Sessions holding Shared, in ascending id order
    pub shared: Vec<SessionId>,
    /// Session holding Exclusive
    pub exclusive: Option<SessionId>,
    /// Queued requests in grant order
    pub waiting: Vec<(SessionId, LockKind)>,
}

impl LockSnapshot {
    /// Check if nobody holds or waits for the table
    pub fn is_free(&self) -> bool {
        self.shared.is_empty() && self.exclusive.is_none() && self.waiting.is_empty()
    }
}

/// Holders and wait queue of a single table
#[derive(Debug, Default)]
pub struct LockTable {
    shared: FxHashSet<SessionId>,
    exclusive: Option<SessionId>,
    queue: VecDeque<LockRequest>,
}

impl LockTable {
    /// Create an unlocked table with an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock currently held by `session`, if any
    pub fn held_by(&self, session: SessionId) -> Option<LockKind> {
        if self.exclusive == Some(session) {
            Some(LockKind::Exclusive)
        } else if self.shared.contains(&session) {
            Some(LockKind::Shared)
        } else {
            None
        }
    }

    /// Whether `kind` could be granted to `session` given the current holders
    ///
    /// The requester's own Shared lock never conflicts, so a sole Shared
    /// holder can upgrade to Exclusive. The wait queue is not consulted;
    /// fairness is the manager's concern.
    pub fn is_compatible(&self, session: SessionId, kind: LockKind) -> bool {
        let exclusive_ok = self.exclusive.map_or(true, |holder| holder == session);
        match kind {
            LockKind::Shared => exclusive_ok,
            LockKind::Exclusive => {
                exclusive_ok && self.shared.iter().all(|holder| *holder == session)
            }
        }
    }

    /// Record `session` as a holder of `kind`
    ///
    /// Granting Exclusive to a Shared holder upgrades in place. Granting
    /// Shared to the Exclusive holder is a no-op. Callers must check
    /// [`is_compatible`](Self::is_compatible) first.
    pub fn grant(&mut self, session: SessionId, kind: LockKind) {
        debug_assert!(self.is_compatible(session, kind));
        match kind {
            LockKind::Shared => {
                if self.exclusive != Some(session) {
                    self.shared.insert(session);
                }
            }
            LockKind::Exclusive => {
                self.shared.remove(&session);
                self.exclusive = Some(session);
            }
        }
    }

    /// Drop whatever lock `session` holds, returning its kind
    pub fn release(&mut self, session: SessionId) -> Option<LockKind> {
        if self.exclusive == Some(session) {
            self.exclusive = None;
            Some(LockKind::Exclusive)
        } else if self.shared.remove(&session) {
            Some(LockKind::Shared)
        } else {
            None
        }
    }

    /// Drop `session`'s Shared lock; an Exclusive lock is left untouched
    pub fn release_shared(&mut self, session: SessionId) -> bool {
        self.shared.remove(&session)
    }

    /// Append a request to the wait queue
    ///
    /// Upgrade requests (the requester already holds Shared) are placed
    /// ahead of every plain request but behind earlier upgrades: the
    /// upgrader's own Shared lock blocks any Exclusive request queued
    /// before it, so queueing it last could only end in a timeout.
    pub fn enqueue(&mut self, request: LockRequest) {
        let is_upgrade = self.shared.contains(&request.session);
        if !is_upgrade {
            self.queue.push_back(request);
            return;
        }
        let position = self
            .queue
            .iter()
            .position(|queued| !self.shared.contains(&queued.session))
            .unwrap_or(self.queue.len());
        self.queue.insert(position, request);
    }

    /// Remove a queued request by ticket
    pub fn remove_request(&mut self, ticket: u64) -> Option<LockRequest> {
        let position = self.queue.iter().position(|r| r.ticket == ticket)?;
        self.queue.remove(position)
    }

    /// Check if any request is queued
    pub fn has_waiters(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Tickets of every request `session` has queued on this table
    pub fn tickets_of(&self, session: SessionId) -> Vec<u64> {
        self.queue
            .iter()
            .filter(|r| r.session == session)
            .map(|r| r.ticket)
            .collect()
    }

    /// Check if `session` has a request queued on this table
    pub fn is_waiting(&self, session: SessionId) -> bool {
        self.queue.iter().any(|r| r.session == session)
    }

    /// Grant queued requests from the head while they are compatible
    ///
    /// Requests are granted strictly in queue order. Consecutive Shared
    /// requests at the head are granted together; the first request that
    /// cannot be granted stops the scan, so nothing behind a blocked
    /// Exclusive request is granted ahead of it.
    pub fn grant_waiters(&mut self) -> Vec<LockRequest> {
        let mut granted = Vec::new();
        while let Some(head) = self.queue.front().copied() {
            let satisfied = self
                .held_by(head.session)
                .map_or(false, |held| held.covers(head.kind));
            if !satisfied {
                if !self.is_compatible(head.session, head.kind) {
                    break;
                }
                self.grant(head.session, head.kind);
            }
            self.queue.pop_front();
            granted.push(head);
        }
        granted
    }

    /// Check if the table has no holders and no waiters
    pub fn is_idle(&self) -> bool {
        self.shared.is_empty() && self.exclusive.is_none() && self.queue.is_empty()
    }

    /// Current Exclusive holder
    pub fn exclusive_holder(&self) -> Option<SessionId> {
        self.exclusive
    }

    /// Number of Shared holders
    pub fn shared_count(&self) -> usize {
        self.shared.len()
    }

    /// Point-in-time view of holders and waiters
    pub fn snapshot(&self) -> LockSnapshot {
        let mut shared: Vec<_> = self.shared.iter().copied().collect();
        shared.sort();
        LockSnapshot {
            shared,
            exclusive: self.exclusive,
            waiting: self.queue.iter().map(|r| (r.session, r.kind)).collect(),
        }
    }
}
