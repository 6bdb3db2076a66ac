//! Error types for pool and task operations.

use thiserror::Error;

/// Errors returned by [`TaskPool`](crate::core::TaskPool) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The deadline elapsed before the queue accepted the task.
    #[error("deadline exceeded before the task was accepted")]
    DeadlineExceeded,
    /// The submission was cancelled before the queue accepted the task.
    #[error("submission cancelled")]
    Cancelled,
    /// The pool no longer accepts submissions.
    #[error("pool closed")]
    PoolClosed,
    /// The shutdown signal has already been sent.
    #[error("pool already shut down")]
    AlreadyShutDown,
    /// Outstanding work did not drain within the shutdown timeout.
    #[error("drain timed out with {in_flight} task(s) in flight")]
    DrainTimeout {
        /// Tasks still in flight when the timeout elapsed.
        in_flight: usize,
    },
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker: {0}")]
    Spawn(String),
    /// Internal error (runtime handoff failure and the like).
    #[error("internal error: {0}")]
    Internal(String),
}

impl PoolError {
    /// Whether this error was recorded as a task failure in the pool's
    /// accounting.
    #[must_use]
    pub const fn counts_as_failure(&self) -> bool {
        matches!(self, Self::DeadlineExceeded | Self::Cancelled)
    }
}

/// Why a task did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The task returned an error.
    #[error("task failed: {0}")]
    Failed(String),
    /// The task panicked; the payload message is preserved.
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Application-facing result using anyhow, the return type of task bodies.
pub type AppResult<T> = Result<T, anyhow::Error>;
