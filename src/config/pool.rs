//! Task pool configuration.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default number of worker threads.
pub const DEFAULT_WORKER_COUNT: usize = 10;

/// Default number of queue slots.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default worker thread name prefix.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "task-pool-worker";

/// Default worker thread stack size (2 MiB).
pub const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;

const ENV_WORKERS: &str = "TASK_POOL_WORKERS";
const ENV_QUEUE_CAPACITY: &str = "TASK_POOL_QUEUE_CAPACITY";
const ENV_THREAD_PREFIX: &str = "TASK_POOL_THREAD_PREFIX";
const ENV_STACK_SIZE: &str = "TASK_POOL_STACK_SIZE";

/// Configuration for a [`TaskPool`](crate::core::TaskPool).
///
/// Immutable once handed to the pool. Fields missing from a serialized form
/// fall back to their defaults.
///
/// ```
/// use prometheus_task_pool::config::TaskPoolConfig;
///
/// let config = TaskPoolConfig::new()
///     .with_worker_count(4)
///     .with_queue_capacity(0);
/// assert_eq!(config.worker_count, 4);
/// assert_eq!(config.queue_capacity, 0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPoolConfig {
    /// Number of concurrent worker threads. Must be greater than 0.
    pub worker_count: usize,
    /// Bounded queue slot count. 0 means every submission is a direct
    /// hand-off to an idle worker.
    pub queue_capacity: usize,
    /// Worker threads are named `{thread_name_prefix}-{worker_id}`.
    pub thread_name_prefix: String,
    /// Stack size of each worker thread in bytes.
    pub thread_stack_size: usize,
}

impl Default for TaskPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
        }
    }
}

impl TaskPoolConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the worker thread stack size in bytes.
    #[must_use]
    pub fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.thread_stack_size == 0 {
            return Err("thread_stack_size must be greater than 0".into());
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Recognised variables: `TASK_POOL_WORKERS`, `TASK_POOL_QUEUE_CAPACITY`,
    /// `TASK_POOL_THREAD_PREFIX`, `TASK_POOL_STACK_SIZE`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed, or if the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is the common case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, applying each
    /// present key over the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_WORKERS)? {
            cfg.worker_count = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_QUEUE_CAPACITY)? {
            cfg.queue_capacity = v;
        }
        if let Some(v) = lookup(ENV_THREAD_PREFIX) {
            cfg.thread_name_prefix = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_STACK_SIZE)? {
            cfg.thread_stack_size = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|e| format!("{key}: {e}")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = TaskPoolConfig::default();
        assert_eq!(cfg.worker_count, 10);
        assert_eq!(cfg.queue_capacity, 100);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_is_valid() {
        let cfg = TaskPoolConfig::new().with_queue_capacity(0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("TASK_POOL_WORKERS", "3"), ("TASK_POOL_THREAD_PREFIX", "io")]);
        let cfg = TaskPoolConfig::from_lookup(|k| vars.get(k).map(ToString::to_string)).unwrap();
        assert_eq!(cfg.worker_count, 3);
        assert_eq!(cfg.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(cfg.thread_name_prefix, "io");
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let err = TaskPoolConfig::from_lookup(|k| {
            (k == "TASK_POOL_QUEUE_CAPACITY").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.starts_with("TASK_POOL_QUEUE_CAPACITY"));
    }
}
