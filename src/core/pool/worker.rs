//! Worker thread loop.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{select, Receiver};
use tracing::{debug, debug_span};
use uuid::Uuid;

use crate::config::TaskPoolConfig;
use crate::core::task::{ExecContext, Task};

use super::accounting::Accounting;

/// Spawn a worker thread.
///
/// The worker services the queue until the shutdown channel disconnects
/// (or, if the pool vanished without signalling, until the queue does).
pub(super) fn spawn_worker(
    worker_id: usize,
    pool_id: Uuid,
    config: &TaskPoolConfig,
    task_rx: Receiver<Task>,
    shutdown_rx: Receiver<()>,
    accounting: Arc<Accounting>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{}-{worker_id}", config.thread_name_prefix))
        .stack_size(config.thread_stack_size)
        .spawn(move || {
            let span = debug_span!("worker", %pool_id, worker_id);
            let _enter = span.enter();
            debug!("Worker thread started");

            let mut ctx = ExecContext::default();
            loop {
                select! {
                    recv(task_rx) -> msg => {
                        let Ok(task) = msg else {
                            debug!("Task queue disconnected, exiting");
                            break;
                        };
                        let outcome = ctx.execute(task);
                        accounting.complete(&outcome);
                    }
                    recv(shutdown_rx) -> _ => {
                        debug!("Shutdown signal observed, exiting");
                        break;
                    }
                }
            }

            debug!("Worker thread exiting");
        })
}
