//! Bounded task pool backed by dedicated worker threads.
//!
//! A fixed set of OS threads consumes [`Task`]s from one bounded queue. The
//! queue is the backpressure mechanism: when every slot is taken, `submit`
//! blocks until a slot frees up, the submission's [`Deadline`] passes, or its
//! [`CancellationToken`] fires.
//!
//! # Accounting
//!
//! - `in_flight` is bumped before a submission waits for a slot and dropped
//!   when the task completes (or when the submission gives up).
//! - `failed` counts tasks that returned `Err`, panicked, or never reached
//!   the queue. Once the pool has drained,
//!   `submitted == succeeded + failed`.
//!
//! # Shutdown
//!
//! [`TaskPool::shutdown`] closes the pool to new submissions, waits on a
//! condvar until `in_flight` reaches zero, broadcasts the shutdown signal and
//! joins every worker.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use prometheus_task_pool::config::TaskPoolConfig;
//! use prometheus_task_pool::core::{Task, TaskPool};
//!
//! let pool = TaskPool::new(TaskPoolConfig::new().with_worker_count(4).with_queue_capacity(8))?;
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! for _ in 0..100 {
//!     let hits = Arc::clone(&hits);
//!     pool.submit(
//!         Task::infallible(move || {
//!             hits.fetch_add(1, Ordering::Relaxed);
//!         }),
//!         Duration::from_secs(5),
//!     )?;
//! }
//!
//! pool.shutdown()?;
//! assert_eq!(hits.load(Ordering::Relaxed), 100);
//! assert_eq!(pool.failure_count(), 0);
//! # Ok::<(), prometheus_task_pool::core::PoolError>(())
//! ```

mod accounting;
mod worker;

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, never, Select, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[cfg(feature = "tokio-runtime")]
use std::future::Future;

use crate::config::TaskPoolConfig;

use super::deadline::{CancellationToken, Deadline};
use super::error::PoolError;
use super::task::Task;

use accounting::Accounting;
pub use accounting::PoolStats;
use worker::spawn_worker;

/// Worker pool with a bounded queue and aggregate outcome accounting.
///
/// Workers start in [`new`](Self::new) and stop in
/// [`shutdown`](Self::shutdown). Dropping a pool without shutting it down
/// signals the workers to exit but does not wait for them, and tasks still
/// queued at that point may never run.
#[derive(Debug)]
pub struct TaskPool {
    /// Identifier carried in log fields.
    id: Uuid,

    /// Pool configuration.
    config: TaskPoolConfig,

    /// Producer side of the bounded queue.
    task_tx: Sender<Task>,

    /// Dropping this sender is the shutdown broadcast. `None` once sent.
    shutdown_tx: Mutex<Option<Sender<()>>>,

    /// Counters shared with every worker.
    accounting: Arc<Accounting>,

    /// Worker thread handles, drained by shutdown.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskPool {
    /// Create a pool and start its workers.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration does not validate
    /// - `PoolError::Spawn` if a worker thread cannot be started; workers
    ///   already started are stopped before returning
    pub fn new(config: TaskPoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let id = Uuid::new_v4();
        let (task_tx, task_rx) = bounded::<Task>(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let accounting = Arc::new(Accounting::default());

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let spawned = spawn_worker(
                worker_id,
                id,
                &config,
                task_rx.clone(),
                shutdown_rx.clone(),
                Arc::clone(&accounting),
            );
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    error!(pool_id = %id, worker_id, error = %e, "Failed to spawn worker thread");
                    drop(shutdown_tx);
                    join_workers(id, workers);
                    return Err(PoolError::Spawn(e.to_string()));
                }
            }
        }

        info!(
            pool_id = %id,
            worker_count = config.worker_count,
            queue_capacity = config.queue_capacity,
            "TaskPool started"
        );

        Ok(Self {
            id,
            config,
            task_tx,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            accounting,
            workers: Mutex::new(workers),
        })
    }

    /// Submit a task, waiting for a queue slot until `deadline`.
    ///
    /// `deadline` accepts a [`Duration`] (relative timeout), an [`Instant`],
    /// a [`CancellationToken`] or a full [`Deadline`]. An already expired
    /// deadline or cancelled token fails without blocking. Once accepted the
    /// task runs exactly once on some worker; its own success or failure is
    /// only visible through the counters.
    ///
    /// # Errors
    ///
    /// - `PoolError::PoolClosed` if shutdown has begun (not counted)
    /// - `PoolError::DeadlineExceeded` / `PoolError::Cancelled` if the task
    ///   was not accepted in time (counted as one failure)
    pub fn submit(&self, task: Task, deadline: impl Into<Deadline>) -> Result<(), PoolError> {
        let deadline = deadline.into();
        self.accounting.admit()?;

        match self.enqueue(task, &deadline) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.accounting.reject();
                warn!(pool_id = %self.id, error = %err, "Task not accepted by pool");
                Err(err)
            }
        }
    }

    /// Submit from async code.
    ///
    /// The blocking wait for a queue slot runs on tokio's blocking thread
    /// pool, so this must be awaited inside a tokio runtime. Dropping the
    /// returned future does not abort the wait; attach a
    /// [`CancellationToken`] to the deadline for that.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit), plus `PoolError::Internal` if the
    /// blocking hand-off itself fails.
    #[cfg(feature = "tokio-runtime")]
    pub fn submit_async(
        self: &Arc<Self>,
        task: Task,
        deadline: Deadline,
    ) -> impl Future<Output = Result<(), PoolError>> + Send + 'static {
        let pool = Arc::clone(self);
        async move {
            match tokio::task::spawn_blocking(move || pool.submit(task, deadline)).await {
                Ok(result) => result,
                Err(e) => Err(PoolError::Internal(format!("submission hand-off failed: {e}"))),
            }
        }
    }

    /// Race the queue send against the deadline and the cancellation token.
    fn enqueue(&self, task: Task, deadline: &Deadline) -> Result<(), PoolError> {
        deadline.check()?;

        let not_cancellable = never::<()>();
        let cancel_rx = deadline
            .token()
            .map_or(&not_cancellable, CancellationToken::signal);

        let mut sel = Select::new();
        let send_idx = sel.send(&self.task_tx);
        let cancel_idx = sel.recv(cancel_rx);

        let oper = match deadline.instant() {
            Some(at) => sel
                .select_deadline(at)
                .map_err(|_| PoolError::DeadlineExceeded)?,
            None => sel.select(),
        };

        if oper.index() == send_idx {
            oper.send(&self.task_tx, task)
                .map_err(|_| PoolError::Internal("task queue disconnected".into()))
        } else {
            debug_assert_eq!(oper.index(), cancel_idx);
            let _ = oper.recv(cancel_rx);
            Err(PoolError::Cancelled)
        }
    }

    /// Tasks submitted but not yet completed.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.accounting.in_flight()
    }

    /// Tasks that failed, panicked or were never accepted.
    #[must_use]
    pub fn failure_count(&self) -> u64 {
        self.accounting.failed()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.accounting.snapshot(
            self.config.worker_count,
            self.config.queue_capacity,
            self.task_tx.len(),
        )
    }

    /// Whether the pool has stopped accepting submissions.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.accounting.is_closed()
    }

    /// Pool identifier used in logs.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration the pool was built with.
    #[must_use]
    pub const fn config(&self) -> &TaskPoolConfig {
        &self.config
    }

    /// Close the pool, wait for all in-flight work to finish, then stop and
    /// join the workers.
    ///
    /// Must not be called from inside a task running on this pool: the
    /// calling task is itself in flight, so the drain never completes.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::AlreadyShutDown` if the workers were already
    /// signalled.
    pub fn shutdown(&self) -> Result<(), PoolError> {
        self.shutdown_until(None)
    }

    /// Like [`shutdown`](Self::shutdown) but gives up waiting for the drain
    /// after `timeout`.
    ///
    /// On timeout the pool stays closed to submissions, workers keep
    /// servicing the queue, and shutdown may be retried.
    ///
    /// # Errors
    ///
    /// - `PoolError::DrainTimeout` if work is still in flight at the timeout
    /// - `PoolError::AlreadyShutDown` if the workers were already signalled
    pub fn shutdown_timeout(&self, timeout: Duration) -> Result<(), PoolError> {
        self.shutdown_until(Instant::now().checked_add(timeout))
    }

    fn shutdown_until(&self, deadline: Option<Instant>) -> Result<(), PoolError> {
        if self.shutdown_tx.lock().is_none() {
            return Err(PoolError::AlreadyShutDown);
        }

        if self.accounting.close() {
            info!(
                pool_id = %self.id,
                in_flight = self.accounting.in_flight(),
                "TaskPool closed to new submissions, draining"
            );
        }

        if !self.accounting.wait_drained(deadline) {
            let in_flight = self.accounting.in_flight();
            warn!(pool_id = %self.id, in_flight, "TaskPool did not drain before timeout");
            return Err(PoolError::DrainTimeout { in_flight });
        }

        // Dropping the sender disconnects every worker's shutdown receiver.
        if self.shutdown_tx.lock().take().is_none() {
            return Err(PoolError::AlreadyShutDown);
        }

        let workers = std::mem::take(&mut *self.workers.lock());
        let worker_count = workers.len();
        join_workers(self.id, workers);

        let stats = self.stats();
        info!(
            pool_id = %self.id,
            worker_count,
            submitted = stats.submitted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "TaskPool shut down"
        );
        Ok(())
    }
}

/// Join every worker, logging any that panicked. Returns how many panicked.
fn join_workers(pool_id: Uuid, workers: Vec<JoinHandle<()>>) -> usize {
    let mut panicked = 0;
    for (worker_id, handle) in workers.into_iter().enumerate() {
        if handle.join().is_err() {
            warn!(%pool_id, worker_id, "Worker thread panicked");
            panicked += 1;
        } else {
            debug!(%pool_id, worker_id, "Worker joined");
        }
    }
    panicked
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.accounting.close();
        if self.shutdown_tx.lock().take().is_some() {
            // Workers are not joined here; a task may still be running.
            debug!(
                pool_id = %self.id,
                "TaskPool dropped without explicit shutdown - workers will be detached"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pool(workers: usize, capacity: usize) -> TaskPool {
        TaskPool::new(
            TaskPoolConfig::new()
                .with_worker_count(workers)
                .with_queue_capacity(capacity),
        )
        .unwrap()
    }

    #[test]
    fn test_join_workers_reports_panicked_threads() {
        let handles = vec![
            std::thread::spawn(|| {}),
            std::thread::spawn(|| panic!("worker died")),
            std::thread::spawn(|| {}),
        ];
        let panicked = join_workers(Uuid::new_v4(), handles);
        assert_eq!(panicked, 1);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let err = TaskPool::new(TaskPoolConfig::new().with_worker_count(0)).unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfig(_)));
    }

    #[test]
    fn test_basic_submit_and_shutdown() {
        let pool = pool(2, 4);
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let count = Arc::clone(&count);
            pool.submit(
                Task::infallible(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                }),
                Duration::from_secs(5),
            )
            .unwrap();
        }
        pool.shutdown().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 10);
        let stats = pool.stats();
        assert_eq!(stats.submitted, 10);
        assert_eq!(stats.succeeded, 10);
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.queued, 0);
    }

    #[test]
    fn test_failures_are_counted() {
        let pool = pool(1, 4);
        pool.submit(Task::new(|| Err(anyhow::anyhow!("nope"))), Deadline::never())
            .unwrap();
        pool.submit(Task::infallible(|| panic!("boom")), Deadline::never())
            .unwrap();
        pool.submit(Task::new(|| Ok(())), Deadline::never()).unwrap();
        pool.shutdown().unwrap();

        let stats = pool.stats();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.panicked, 1);
        assert_eq!(stats.succeeded, 1);
    }

    #[test]
    fn test_shutdown_twice() {
        let pool = pool(1, 0);
        pool.shutdown().unwrap();
        assert_eq!(pool.shutdown(), Err(PoolError::AlreadyShutDown));
        assert_eq!(
            pool.shutdown_timeout(Duration::from_millis(1)),
            Err(PoolError::AlreadyShutDown)
        );
    }

    #[test]
    fn test_submit_after_shutdown_fails_fast() {
        let pool = pool(1, 1);
        pool.shutdown().unwrap();
        let err = pool
            .submit(Task::infallible(|| {}), Deadline::never())
            .unwrap_err();
        assert_eq!(err, PoolError::PoolClosed);
        assert_eq!(pool.failure_count(), 0);
        assert_eq!(pool.stats().submitted, 0);
    }

    #[test]
    fn test_worker_threads_are_named() {
        let pool = TaskPool::new(
            TaskPoolConfig::new()
                .with_worker_count(1)
                .with_thread_name_prefix("named"),
        )
        .unwrap();
        let (tx, rx) = crossbeam_channel::bounded(1);
        pool.submit(
            Task::infallible(move || {
                let name = std::thread::current().name().map(ToString::to_string);
                let _ = tx.send(name);
            }),
            Deadline::never(),
        )
        .unwrap();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("named-0"));
        pool.shutdown().unwrap();
    }

    #[test]
    fn test_drop_without_shutdown_does_not_hang() {
        let pool = pool(2, 2);
        pool.submit(Task::infallible(|| {}), Deadline::never()).unwrap();
        drop(pool);
    }
}
