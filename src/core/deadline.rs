//! Submission deadlines and cancellation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use super::error::PoolError;

/// A cloneable, one-shot cancellation signal.
///
/// Cancelling drops the only sender of an internal channel, so every clone
/// (and every blocked submission selecting on it) observes the disconnect at
/// once.
///
/// ```
/// use prometheus_task_pool::core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let child = token.clone();
/// token.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug)]
struct TokenInner {
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(TokenInner {
                trigger: Mutex::new(Some(tx)),
                signal: rx,
            }),
        }
    }

    /// Cancel the token. Idempotent.
    pub fn cancel(&self) {
        self.inner.trigger.lock().take();
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.trigger.lock().is_none()
    }

    /// Receiver that becomes ready (disconnected) once cancelled.
    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// How long a submission may wait for a queue slot.
///
/// Combines an optional point in time with an optional
/// [`CancellationToken`]. With neither, submission waits indefinitely.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    at: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl Deadline {
    /// No time limit and no cancellation.
    #[must_use]
    pub const fn never() -> Self {
        Self {
            at: None,
            cancel: None,
        }
    }

    /// Expire `timeout` from now. A timeout too large to represent is
    /// treated as no limit.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(timeout),
            cancel: None,
        }
    }

    /// Expire at `instant`.
    #[must_use]
    pub const fn at(instant: Instant) -> Self {
        Self {
            at: Some(instant),
            cancel: None,
        }
    }

    /// Also abort the wait when `token` is cancelled.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The expiry instant, if any.
    #[must_use]
    pub const fn instant(&self) -> Option<Instant> {
        self.at
    }

    /// The attached cancellation token, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Whether the expiry instant has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| at <= Instant::now())
    }

    /// Fail if the wait is already over. Cancellation wins over expiry.
    pub(crate) fn check(&self) -> Result<(), PoolError> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(PoolError::Cancelled);
        }
        if self.is_expired() {
            return Err(PoolError::DeadlineExceeded);
        }
        Ok(())
    }
}

impl From<Duration> for Deadline {
    fn from(timeout: Duration) -> Self {
        Self::after(timeout)
    }
}

impl From<Instant> for Deadline {
    fn from(instant: Instant) -> Self {
        Self::at(instant)
    }
}

impl From<CancellationToken> for Deadline {
    fn from(token: CancellationToken) -> Self {
        Self::never().with_cancel(token)
    }
}
