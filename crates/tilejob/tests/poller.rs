mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use tilejob::{JobHandle, JobOutcome, JobStatus, PollState, PollerConfig, ProgressPoller};
use tokio_util::sync::CancellationToken;

fn poller(backend: &Arc<ScriptedBackend>) -> ProgressPoller {
    ProgressPoller::new(backend.clone(), PollerConfig::default())
}

fn handle() -> JobHandle {
    JobHandle::new("session_test_1")
}

#[tokio::test(start_paused = true)]
async fn test_completes_exactly_once_and_stops() {
    let backend = Arc::new(ScriptedBackend::new(vec![running(5), running(20), completed()]));
    let task = poller(&backend).start(handle());
    let rx = task.subscribe();

    let outcome = task.finish().await.expect("poller should finish");
    match &outcome {
        JobOutcome::Completed(snap) => assert_eq!(snap.downloaded_tiles, 31),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(backend.polls(), 3);

    let view = rx.borrow().clone();
    assert_eq!(view.state, PollState::Done);
    assert_eq!(view.outcome, Some(outcome));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_does_not_end_polling() {
    let backend = Arc::new(ScriptedBackend::new(vec![running(5), network_error(), running(20), completed()]));
    let task = poller(&backend).start(handle());

    // polls land at 0.5s, 2.0s and 3.5s
    tokio::time::sleep(Duration::from_millis(4000)).await;
    assert_eq!(backend.polls(), 3);
    let view = task.view();
    assert_eq!(view.state, PollState::Polling);
    assert_eq!(view.snapshot.map(|s| s.downloaded_tiles), Some(20));
    assert!(view.outcome.is_none());

    let outcome = task.finish().await.expect("poller should finish");
    assert!(outcome.is_success());
    assert_eq!(backend.polls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_first_poll_is_early_then_fixed_cadence() {
    let backend = Arc::new(ScriptedBackend::new(vec![running(1), running(2), completed()]));
    let task = poller(&backend).start(handle());
    task.finish().await.expect("poller should finish");

    let expected = [500u64, 2000, 3500];
    let offsets = backend.poll_offsets();
    assert_eq!(offsets.len(), expected.len());
    for (got, want) in offsets.iter().zip(expected) {
        let want = Duration::from_millis(want);
        assert!(*got >= want && *got < want + Duration::from_millis(5), "poll at {got:?}, wanted {want:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_error_status_carries_backend_message() {
    let backend = Arc::new(ScriptedBackend::new(vec![running(3), failed(Some("Tile server returned 503"))]));
    let outcome = poller(&backend).start(handle()).finish().await;
    match outcome {
        Some(JobOutcome::Failed { message, snapshot }) => {
            assert_eq!(message, "Tile server returned 503");
            assert_eq!(snapshot.status, JobStatus::Error);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_error_status_without_message() {
    let backend = Arc::new(ScriptedBackend::new(vec![failed(None)]));
    let outcome = poller(&backend).start(handle()).finish().await;
    assert!(matches!(outcome, Some(JobOutcome::Failed { message, .. }) if message == "Unknown error"));
}

#[tokio::test(start_paused = true)]
async fn test_teardown_stops_all_polling() {
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let task = poller(&backend).start(handle());

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(backend.polls(), 2);

    drop(task);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.polls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_first_poll() {
    let backend = Arc::new(ScriptedBackend::new(vec![completed()]));
    let task = poller(&backend).start(handle());
    task.cancel();
    assert!(task.is_cancelled());

    assert_eq!(task.finish().await, None);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(backend.polls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_late_response_after_cancel_is_discarded() {
    let backend = Arc::new(ScriptedBackend::new(vec![completed()]).with_latency(Duration::from_secs(1)));
    let token = CancellationToken::new();
    let task = poller(&backend).start_with_token(handle(), token.clone());
    let rx = task.subscribe();

    // first poll goes out at 0.5s and would answer at 1.5s
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(backend.polls(), 1);
    token.cancel();

    tokio::time::sleep(Duration::from_secs(5)).await;
    let view = rx.borrow().clone();
    assert_eq!(view.state, PollState::Polling);
    assert!(view.snapshot.is_none());
    assert!(view.outcome.is_none());
    assert_eq!(task.finish().await, None);
    assert_eq!(backend.polls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_task_leaves_shared_token_alive() {
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let shared = CancellationToken::new();

    let first = poller(&backend).start_with_token(handle(), shared.clone());
    tokio::time::sleep(Duration::from_millis(600)).await;
    drop(first);
    assert!(!shared.is_cancelled());

    let second = poller(&backend).start_with_token(handle(), shared.clone());
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(backend.polls(), 2);

    shared.cancel();
    assert!(second.is_cancelled());
    assert_eq!(second.finish().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_optional_deadline_times_out() {
    let backend = Arc::new(ScriptedBackend::new(vec![running(4)]));
    let config = PollerConfig { max_poll_duration: Some(Duration::from_secs(10)), ..PollerConfig::default() };
    let task = ProgressPoller::new(backend.clone(), config).start(handle());

    match task.finish().await {
        Some(JobOutcome::TimedOut { last: Some(last) }) => assert_eq!(last.status, JobStatus::Running),
        other => panic!("unexpected {other:?}"),
    }
    // 0.5, 2.0, 3.5, 5.0, 6.5, 8.0, 9.5
    assert_eq!(backend.polls(), 7);
}
