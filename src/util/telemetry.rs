//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "prometheus_task_pool=info";

/// Initialize tracing. Users can install their own subscriber; this helper
/// installs a fmt subscriber filtered by `RUST_LOG` (or
/// [`DEFAULT_LOG_FILTER`]) if none is set.
///
/// Worker threads log inside a `worker` span carrying `pool_id` and
/// `worker_id`; `RUST_LOG=prometheus_task_pool=debug` shows per-worker
/// lifecycle and task failures.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
