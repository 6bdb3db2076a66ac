//! Tests for configuration validation and loading

use prometheus_task_pool::config::{TaskPoolConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT};
use prometheus_task_pool::core::{PoolError, TaskPool};

#[test]
fn test_default_config_is_valid() {
    let cfg = TaskPoolConfig::default();
    assert_eq!(cfg.worker_count, DEFAULT_WORKER_COUNT);
    assert_eq!(cfg.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_invalid_worker_count() {
    let cfg = TaskPoolConfig::new().with_worker_count(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_stack_size() {
    let cfg = TaskPoolConfig::new().with_thread_stack_size(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_blank_thread_prefix() {
    let cfg = TaskPoolConfig::new().with_thread_name_prefix("  ");
    assert!(cfg.validate().is_err());
}

#[test]
fn test_pool_rejects_invalid_config() {
    let err = TaskPool::new(TaskPoolConfig::new().with_worker_count(0)).unwrap_err();
    assert_eq!(
        err,
        PoolError::InvalidConfig("worker_count must be greater than 0".into())
    );
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "worker_count": 40,
        "queue_capacity": 10,
        "thread_name_prefix": "fanout"
    }"#;

    let cfg = TaskPoolConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.worker_count, 40);
    assert_eq!(cfg.queue_capacity, 10);
    assert_eq!(cfg.thread_name_prefix, "fanout");
    assert_eq!(cfg.thread_stack_size, TaskPoolConfig::default().thread_stack_size);
}

#[test]
fn test_config_from_json_rejects_invalid_values() {
    assert!(TaskPoolConfig::from_json_str(r#"{"worker_count": 0}"#).is_err());
    assert!(TaskPoolConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_json_round_trip() {
    let cfg = TaskPoolConfig::new().with_worker_count(3).with_queue_capacity(0);
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(TaskPoolConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_config_from_lookup_defaults_when_unset() {
    let cfg = TaskPoolConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg, TaskPoolConfig::default());
}

#[test]
fn test_config_from_lookup_validates() {
    let result = TaskPoolConfig::from_lookup(|key| (key == "TASK_POOL_WORKERS").then(|| "0".into()));
    assert!(result.is_err());
}
