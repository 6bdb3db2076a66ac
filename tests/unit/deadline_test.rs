//! Tests for deadlines and cancellation tokens

use prometheus_task_pool::core::{CancellationToken, Deadline};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_deadline_from_duration() {
    let before = Instant::now();
    let deadline: Deadline = Duration::from_secs(60).into();
    let at = deadline.instant().unwrap();
    assert!(at >= before + Duration::from_secs(60));
    assert!(!deadline.is_expired());
}

#[test]
fn test_deadline_from_instant() {
    let at = Instant::now() + Duration::from_millis(10);
    let deadline: Deadline = at.into();
    assert_eq!(deadline.instant(), Some(at));
    thread::sleep(Duration::from_millis(15));
    assert!(deadline.is_expired());
}

#[test]
fn test_deadline_from_token() {
    let token = CancellationToken::new();
    let deadline: Deadline = token.clone().into();
    assert!(deadline.instant().is_none());
    assert!(!deadline.token().unwrap().is_cancelled());
    token.cancel();
    assert!(deadline.token().unwrap().is_cancelled());
}

#[test]
fn test_token_cancel_across_threads() {
    let token = CancellationToken::default();
    let remote = token.clone();
    thread::spawn(move || remote.cancel()).join().unwrap();
    assert!(token.is_cancelled());
}
