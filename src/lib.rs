//! # Prometheus Task Pool
//!
//! A bounded worker pool: a fixed number of worker threads consume tasks from
//! one capacity-limited queue, execute them with panic containment, and report
//! aggregate success/failure counts.
//!
//! ## Core Problem Solved
//!
//! Fan-out workloads (batch I/O, CPU-heavy transforms, many small LLM calls)
//! need throttling, not unbounded concurrency:
//!
//! - **Backpressure**: the bounded queue blocks submitters once it is full
//! - **Deadline-bound submission**: a submitter waits for a slot only until its
//!   deadline passes or its cancellation token fires
//! - **Fault isolation**: a panicking task is counted as a failure and its
//!   worker keeps running
//! - **Graceful shutdown**: shutdown waits for in-flight work to drain before
//!   stopping the workers
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use prometheus_task_pool::config::TaskPoolConfig;
//! use prometheus_task_pool::core::{Task, TaskPool};
//!
//! let pool = TaskPool::new(
//!     TaskPoolConfig::new()
//!         .with_worker_count(4)
//!         .with_queue_capacity(16),
//! )?;
//!
//! pool.submit(Task::new(|| Ok(())), Duration::from_secs(1))?;
//! pool.submit(Task::new(|| anyhow::bail!("upstream returned 503")), Duration::from_secs(1))?;
//!
//! pool.shutdown()?;
//! assert_eq!(pool.failure_count(), 1);
//! # Ok::<(), prometheus_task_pool::core::PoolError>(())
//! ```
//!
//! Async work is submitted with [`Task::from_future`](core::Task::from_future)
//! and runs on the worker's own single-threaded tokio runtime
//! (feature `tokio-runtime`, enabled by default).

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core pool abstractions: tasks, deadlines, errors and the pool itself.
pub mod core;
/// Configuration models for the pool.
pub mod config;
/// Shared utilities.
pub mod util;
