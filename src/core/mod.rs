//! Core pool abstractions: tasks, deadlines, errors and the pool itself.

pub mod deadline;
pub mod error;
pub mod pool;
pub mod task;

pub use deadline::{CancellationToken, Deadline};
pub use error::{AppResult, PoolError, TaskError};
pub use pool::{PoolStats, TaskPool};
pub use task::{Task, TaskOutcome};
