//! Tests for utility functions

use prometheus_task_pool::util::init_tracing;

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialised twice without panicking");
}
