//! In-flight and failure accounting shared by submitters and workers.

use std::time::Instant;

use parking_lot::{Condvar, Mutex, RwLock};

use crate::core::error::PoolError;
use crate::core::task::TaskOutcome;

/// Snapshot of pool utilization and outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Configured queue slot count.
    pub queue_capacity: usize,
    /// Tasks accepted onto the queue but not yet picked up by a worker.
    pub queued: usize,
    /// Tasks submitted but not yet completed, including submissions still
    /// waiting for a queue slot.
    pub in_flight: usize,
    /// Total submissions admitted (accepted or later rejected by deadline).
    pub submitted: u64,
    /// Tasks that ran and returned `Ok`.
    pub succeeded: u64,
    /// Tasks that failed, panicked, or never left submission.
    pub failed: u64,
    /// Subset of `failed` that panicked.
    pub panicked: u64,
    /// Subset of `failed` whose submission hit its deadline or was cancelled.
    pub rejected: u64,
}

#[derive(Debug, Default)]
struct Counters {
    closed: bool,
    in_flight: usize,
    submitted: u64,
    succeeded: u64,
    failed: u64,
    panicked: u64,
    rejected: u64,
}

impl Counters {
    /// Returns true when the pool has just drained.
    fn release(&mut self) -> bool {
        debug_assert!(self.in_flight > 0, "in_flight underflow");
        self.in_flight = self.in_flight.saturating_sub(1);
        self.in_flight == 0
    }
}

/// All counters live behind one lock. Drain waiters park on a separate
/// mutex/condvar pair that is only taken after the counter lock is released.
#[derive(Debug, Default)]
pub(crate) struct Accounting {
    counters: RwLock<Counters>,
    drain_lock: Mutex<()>,
    drained: Condvar,
}

impl Accounting {
    /// Count a new submission as in flight, unless the pool is closed.
    pub(crate) fn admit(&self) -> Result<(), PoolError> {
        let mut c = self.counters.write();
        if c.closed {
            return Err(PoolError::PoolClosed);
        }
        c.in_flight += 1;
        c.submitted += 1;
        Ok(())
    }

    /// Undo an admission whose task never reached the queue; counts as a failure.
    pub(crate) fn reject(&self) {
        let drained = {
            let mut c = self.counters.write();
            c.failed += 1;
            c.rejected += 1;
            c.release()
        };
        if drained {
            self.notify_drained();
        }
    }

    /// Record the outcome of an executed task.
    pub(crate) fn complete(&self, outcome: &TaskOutcome) {
        let drained = {
            let mut c = self.counters.write();
            if outcome.is_success() {
                c.succeeded += 1;
            } else {
                c.failed += 1;
                if outcome.is_panic() {
                    c.panicked += 1;
                }
            }
            c.release()
        };
        if drained {
            self.notify_drained();
        }
    }

    /// Stop admitting submissions. Returns true if this call closed the pool.
    pub(crate) fn close(&self) -> bool {
        let mut c = self.counters.write();
        !std::mem::replace(&mut c.closed, true)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.counters.read().closed
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.counters.read().in_flight
    }

    pub(crate) fn failed(&self) -> u64 {
        self.counters.read().failed
    }

    /// Block until nothing is in flight or `deadline` passes.
    /// Returns whether the pool drained.
    pub(crate) fn wait_drained(&self, deadline: Option<Instant>) -> bool {
        let mut guard = self.drain_lock.lock();
        loop {
            if self.in_flight() == 0 {
                return true;
            }
            match deadline {
                None => self.drained.wait(&mut guard),
                Some(at) => {
                    if self.drained.wait_until(&mut guard, at).timed_out() {
                        return self.in_flight() == 0;
                    }
                }
            }
        }
    }

    pub(crate) fn snapshot(&self, worker_count: usize, queue_capacity: usize, queued: usize) -> PoolStats {
        let c = self.counters.read();
        PoolStats {
            worker_count,
            queue_capacity,
            queued,
            in_flight: c.in_flight,
            submitted: c.submitted,
            succeeded: c.succeeded,
            failed: c.failed,
            panicked: c.panicked,
            rejected: c.rejected,
        }
    }

    fn notify_drained(&self) {
        let _guard = self.drain_lock.lock();
        self.drained.notify_all();
    }
}
