//! Request correlator.
//!
//! Assigns outgoing request ids from a monotonically increasing counter and
//! keeps one completion slot per outstanding request. The reader task
//! resolves a slot when the matching response arrives; the issuing caller
//! awaits it under its own deadline. Correlation is purely by id, never by
//! send order.
//!
//! Only client-issued ids ever enter the pending table. Ids chosen by the
//! peer for its own requests are handled by the dispatcher and never reach
//! this table, keeping the two id namespaces disjoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::oneshot;

/// Terminal outcome of one request: the response's `result`, or its `error`
/// payload.
pub type Outcome = Result<Value, Value>;

/// Pending-request table plus the id counter.
#[derive(Debug)]
pub struct Correlator {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<Outcome>>>,
}

impl Correlator {
    /// Create an empty correlator. The first assigned id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Atomically allocate the next request id.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a completion slot for `id` and return the receiving half.
    ///
    /// At most one entry may exist per outstanding id; registering an id
    /// twice replaces the first slot, whose waiter then observes a closed
    /// channel.
    pub fn register(&self, id: u64) -> oneshot::Receiver<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.lock_pending().insert(id, tx);
        rx
    }

    /// Resolve the slot matching `id` with `outcome`.
    ///
    /// Returns `false` when no slot matches: the id is unknown, already
    /// timed out, or not numeric. Unmatched responses are the caller's cue
    /// to drop the message silently.
    pub fn resolve(&self, id: &Value, outcome: Outcome) -> bool {
        let Some(id) = id.as_u64() else {
            return false;
        };
        let Some(slot) = self.lock_pending().remove(&id) else {
            return false;
        };
        // A send failure means the waiter already gave up; the outcome is
        // dropped, same as an unmatched id.
        slot.send(outcome).is_ok()
    }

    /// Remove the slot for `id` without resolving it. Used by callers whose
    /// deadline elapsed. Returns whether a slot was present.
    pub fn remove(&self, id: u64) -> bool {
        self.lock_pending().remove(&id).is_some()
    }

    /// Drop every pending slot so all waiters observe a closed channel.
    /// Called when the transport dies; waiters surface the closure as
    /// [`ClientError::TransportClosed`](crate::ClientError::TransportClosed).
    pub fn fail_all(&self) {
        self.lock_pending().clear();
    }

    /// Number of currently outstanding requests.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<u64, oneshot::Sender<Outcome>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}
