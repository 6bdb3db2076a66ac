//! Work units and the fault-containing execution wrapper.
//!
//! A [`Task`] is a zero-argument operation that either succeeds or fails.
//! Running it through [`Task::run`] (or through a pool worker) never lets a
//! panic escape: the panic is caught at the call boundary, logged, and turned
//! into [`TaskOutcome::Failed`] carrying [`TaskError::Panicked`].

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "tokio-runtime")]
use std::future::Future;
#[cfg(feature = "tokio-runtime")]
use std::pin::Pin;

#[cfg(feature = "tokio-runtime")]
use futures::FutureExt;
use tracing::{debug, error};

use super::error::{AppResult, TaskError};

type BlockingJob = Box<dyn FnOnce() -> AppResult<()> + Send + 'static>;

#[cfg(feature = "tokio-runtime")]
type AsyncJob = Pin<Box<dyn Future<Output = AppResult<()>> + Send + 'static>>;

enum Job {
    Blocking(BlockingJob),
    #[cfg(feature = "tokio-runtime")]
    Async(AsyncJob),
}

/// A unit of work accepted by the pool.
///
/// ```
/// use prometheus_task_pool::core::{Task, TaskOutcome};
///
/// let task = Task::new(|| {
///     anyhow::ensure!(1 + 1 == 2, "arithmetic is broken");
///     Ok(())
/// });
/// assert_eq!(task.run(), TaskOutcome::Succeeded);
///
/// let outcome = Task::infallible(|| panic!("boom")).run();
/// assert!(outcome.is_panic());
/// ```
pub struct Task {
    job: Job,
    label: Option<String>,
}

impl Task {
    /// Wrap a fallible closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> AppResult<()> + Send + 'static,
    {
        Self {
            job: Job::Blocking(Box::new(f)),
            label: None,
        }
    }

    /// Wrap a closure that cannot report failure (it may still panic).
    pub fn infallible<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(move || {
            f();
            Ok(())
        })
    }

    /// Wrap a future. It is driven to completion on the executing worker's
    /// own single-threaded tokio runtime.
    #[cfg(feature = "tokio-runtime")]
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = AppResult<()>> + Send + 'static,
    {
        Self {
            job: Job::Async(Box::pin(fut)),
            label: None,
        }
    }

    /// Attach a label used in diagnostics.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The diagnostic label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Execute the task on the calling thread with panic containment.
    #[must_use]
    pub fn run(self) -> TaskOutcome {
        ExecContext::default().execute(self)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.job {
            Job::Blocking(_) => "blocking",
            #[cfg(feature = "tokio-runtime")]
            Job::Async(_) => "async",
        };
        f.debug_struct("Task")
            .field("kind", &kind)
            .field("label", &self.label)
            .finish()
    }
}

/// Result of executing one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task returned `Ok`.
    Succeeded,
    /// The task returned `Err` or panicked.
    Failed(TaskError),
}

impl TaskOutcome {
    /// Whether the task succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Whether the task failed by panicking.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Failed(TaskError::Panicked(_)))
    }
}

/// Per-thread execution state. Workers keep one for their whole life so the
/// async runtime is built at most once per worker.
#[derive(Default)]
pub(crate) struct ExecContext {
    #[cfg(feature = "tokio-runtime")]
    runtime: Option<tokio::runtime::Runtime>,
}

impl ExecContext {
    pub(crate) fn execute(&mut self, task: Task) -> TaskOutcome {
        let Task { job, label } = task;
        let label = label.as_deref().unwrap_or("unlabelled");

        let result = match job {
            Job::Blocking(f) => panic::catch_unwind(AssertUnwindSafe(f)),
            // Neither building nor blocking on a runtime is allowed here.
            #[cfg(feature = "tokio-runtime")]
            Job::Async(_) if tokio::runtime::Handle::try_current().is_ok() => {
                error!(task = label, "Async task run from inside a tokio runtime");
                return TaskOutcome::Failed(TaskError::Failed(
                    "cannot block on an async task from inside a tokio runtime".into(),
                ));
            }
            #[cfg(feature = "tokio-runtime")]
            Job::Async(fut) => match self.runtime() {
                Ok(rt) => rt.block_on(AssertUnwindSafe(fut).catch_unwind()),
                Err(e) => {
                    error!(task = label, error = %e, "Failed to create task runtime");
                    return TaskOutcome::Failed(TaskError::Failed(format!(
                        "task runtime unavailable: {e}"
                    )));
                }
            },
        };

        match result {
            Ok(Ok(())) => TaskOutcome::Succeeded,
            Ok(Err(e)) => {
                let msg = format!("{e:#}");
                debug!(task = label, error = %msg, "Task failed");
                TaskOutcome::Failed(TaskError::Failed(msg))
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                error!(task = label, panic = %msg, "Task panicked; contained by pool");
                TaskOutcome::Failed(TaskError::Panicked(msg))
            }
        }
    }

    #[cfg(feature = "tokio-runtime")]
    fn runtime(&mut self) -> std::io::Result<&tokio::runtime::Runtime> {
        if self.runtime.is_none() {
            self.runtime = Some(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?,
            );
        }
        self.runtime
            .as_ref()
            .ok_or_else(|| std::io::Error::other("task runtime missing"))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
