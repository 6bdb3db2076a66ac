//! Tests for the task execution wrapper

use prometheus_task_pool::core::{Task, TaskError, TaskOutcome};

#[test]
fn test_success_outcome() {
    let outcome = Task::new(|| Ok(())).run();
    assert!(outcome.is_success());
    assert!(!outcome.is_panic());
}

#[test]
fn test_bail_is_failure() {
    let outcome = Task::new(|| anyhow::bail!("quota exhausted")).run();
    assert_eq!(
        outcome,
        TaskOutcome::Failed(TaskError::Failed("quota exhausted".into()))
    );
}

#[test]
fn test_panic_is_contained() {
    let outcome = Task::infallible(|| {
        let v: Vec<u8> = Vec::new();
        std::hint::black_box(v[3]);
    })
    .with_label("out-of-bounds")
    .run();
    assert!(outcome.is_panic());
    assert!(!outcome.is_success());
}

#[cfg(feature = "tokio-runtime")]
#[test]
fn test_future_task_runs_standalone() {
    let outcome = Task::from_future(async {
        tokio::task::yield_now().await;
        Ok(())
    })
    .run();
    assert_eq!(outcome, TaskOutcome::Succeeded);
}
