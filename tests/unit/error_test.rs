//! Tests for error types

use prometheus_task_pool::core::{PoolError, TaskError};

#[test]
fn test_deadline_exceeded_error() {
    let err = PoolError::DeadlineExceeded;
    assert_eq!(
        format!("{}", err),
        "deadline exceeded before the task was accepted"
    );
}

#[test]
fn test_cancelled_error() {
    assert_eq!(format!("{}", PoolError::Cancelled), "submission cancelled");
}

#[test]
fn test_already_shut_down_error() {
    assert_eq!(
        format!("{}", PoolError::AlreadyShutDown),
        "pool already shut down"
    );
}

#[test]
fn test_spawn_error() {
    let err = PoolError::Spawn("resource temporarily unavailable".to_string());
    assert_eq!(
        format!("{}", err),
        "failed to spawn worker: resource temporarily unavailable"
    );
}

#[test]
fn test_task_errors() {
    assert_eq!(
        TaskError::Failed("timeout".into()).to_string(),
        "task failed: timeout"
    );
    assert_eq!(
        TaskError::Panicked("index out of bounds".into()).to_string(),
        "task panicked: index out of bounds"
    );
}

#[test]
fn test_pool_error_into_anyhow() {
    let err: anyhow::Error = PoolError::PoolClosed.into();
    assert_eq!(err.downcast_ref::<PoolError>(), Some(&PoolError::PoolClosed));
}
