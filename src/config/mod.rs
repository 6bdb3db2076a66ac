//! Configuration models for the task pool.

pub mod pool;

pub use pool::{
    TaskPoolConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_THREAD_NAME_PREFIX, DEFAULT_THREAD_STACK_SIZE,
    DEFAULT_WORKER_COUNT,
};
