// tests/connection_machine.rs

use std::sync::Arc;

use tokio::time::{Duration, sleep, timeout};

use spoolr::connection::{ConnectionId, ConnectionManager, ConnectionPolicy, ConnectionState};
use spoolr::types::MatchPolicy;
use spoolr_test_utils::builders::PolicyBuilder;
use spoolr_test_utils::fake_endpoint::{FakeEndpoint, Resolution, Trace, TraceListener};
use spoolr_test_utils::{init_tracing, with_timeout};

fn single(trace: &Trace, endpoint: Arc<FakeEndpoint>) -> (ConnectionManager, ConnectionId) {
    let mut manager = ConnectionManager::new(
        MatchPolicy::Instance,
        Arc::new(TraceListener::new(trace)),
    );
    let id = manager.add_connection(endpoint);
    (manager, id)
}

/// Count completion notifications arriving within `window`.
async fn completions_within(manager: &mut ConnectionManager, window: Duration) -> usize {
    let mut count = 0;
    while timeout(window, manager.next_completion()).await.is_ok() {
        count += 1;
    }
    count
}

#[tokio::test]
async fn test_replaced_timeout_timer_never_delivers() {
    init_tracing();
    let trace = Trace::new();
    let policy = PolicyBuilder::new().timeout(Duration::from_millis(60)).build();
    let endpoint = FakeEndpoint::new("A", &trace)
        .with_policy(policy)
        .otherwise(Resolution::Hang)
        .arc();
    let (mut manager, id) = single(&trace, endpoint);
    let connection = manager.connection(id).unwrap().clone();

    connection.connect();
    sleep(Duration::from_millis(30)).await;
    // Second start before the first timer fires.
    connection.connect();

    assert_eq!(completions_within(&mut manager, Duration::from_millis(150)).await, 1);
    assert_eq!(connection.attempts(), 2);
    assert!(!connection.timeout_armed());
}

#[tokio::test]
async fn test_timeout_forces_completion_once_even_if_endpoint_resolves_late() {
    init_tracing();
    let trace = Trace::new();
    let policy = PolicyBuilder::new().timeout(Duration::from_millis(30)).build();
    let endpoint = FakeEndpoint::new("A", &trace)
        .with_policy(policy)
        .resolutions(&[Resolution::Manual])
        .arc();
    let (mut manager, id) = single(&trace, endpoint.clone());
    let connection = manager.connection(id).unwrap().clone();

    connection.connect();
    let first = with_timeout(manager.next_completion()).await;
    assert_eq!(first, Some(id));
    assert_eq!(connection.state(), ConnectionState::Connecting);

    // The endpoint answers after the deadline.
    endpoint.resolve(true);
    assert_eq!(connection.state(), ConnectionState::Succeeded);
    assert_eq!(completions_within(&mut manager, Duration::from_millis(80)).await, 0);
}

#[tokio::test]
async fn test_success_cancels_timeout_timer() {
    init_tracing();
    let trace = Trace::new();
    let policy = PolicyBuilder::new().timeout(Duration::from_millis(40)).build();
    let endpoint = FakeEndpoint::new("A", &trace).with_policy(policy).arc();
    let (mut manager, id) = single(&trace, endpoint);
    let connection = manager.connection(id).unwrap().clone();

    connection.connect();

    assert_eq!(connection.state(), ConnectionState::Succeeded);
    assert!(!connection.timeout_armed());
    assert_eq!(completions_within(&mut manager, Duration::from_millis(100)).await, 1);
}

#[tokio::test]
async fn test_permanent_failure_after_max_attempts() {
    init_tracing();
    let trace = Trace::new();
    let policy = PolicyBuilder::new()
        .reconnect_after(Duration::from_millis(10))
        .max_attempts(3)
        .build();
    let endpoint = FakeEndpoint::new("A", &trace)
        .with_policy(policy)
        .otherwise(Resolution::Fail)
        .arc();
    let (mut manager, id) = single(&trace, endpoint);
    let connection = manager.connection(id).unwrap().clone();

    connection.connect();
    let done = with_timeout(manager.next_completion()).await;

    assert_eq!(done, Some(id));
    assert_eq!(connection.attempts(), 3);
    assert_eq!(connection.state(), ConnectionState::Failed);
    assert_eq!(trace.count("fail(A)"), 3);
    assert!(!connection.reconnect_armed());
}

#[tokio::test]
async fn test_failure_without_reconnect_delay_completes_immediately() {
    init_tracing();
    let trace = Trace::new();
    let endpoint = FakeEndpoint::new("A", &trace)
        .with_policy(ConnectionPolicy {
            attempt_timeout: Duration::ZERO,
            reconnect_delay: None,
            max_attempts: None,
        })
        .otherwise(Resolution::Fail)
        .arc();
    let (mut manager, id) = single(&trace, endpoint);
    let connection = manager.connection(id).unwrap().clone();

    connection.connect();

    assert_eq!(with_timeout(manager.next_completion()).await, Some(id));
    assert_eq!(connection.attempts(), 1);
    assert_eq!(connection.state(), ConnectionState::Failed);
}

#[tokio::test]
async fn test_reconnect_loop_survives_forced_completion() {
    init_tracing();
    let trace = Trace::new();
    let policy = PolicyBuilder::new()
        .timeout(Duration::from_millis(30))
        .reconnect_after(Duration::from_millis(60))
        .build();
    let endpoint = FakeEndpoint::new("A", &trace)
        .with_policy(policy)
        .resolutions(&[Resolution::Manual])
        .arc();
    let (mut manager, id) = single(&trace, endpoint.clone());
    let connection = manager.connection(id).unwrap().clone();

    connection.connect();
    assert_eq!(with_timeout(manager.next_completion()).await, Some(id));

    // The first attempt fails after the forced completion; the retry still
    // happens and its success is reported for the new attempt.
    endpoint.resolve(false);
    assert_eq!(connection.state(), ConnectionState::Reconnecting);
    assert_eq!(with_timeout(manager.next_completion()).await, Some(id));

    assert_eq!(connection.attempts(), 2);
    assert_eq!(connection.state(), ConnectionState::Succeeded);
    assert_eq!(trace.count("reconnect(A)"), 1);
}

#[tokio::test]
async fn test_reconnects_share_the_first_attempts_deadline() {
    init_tracing();
    let trace = Trace::new();
    let policy = PolicyBuilder::new()
        .timeout(Duration::from_millis(150))
        .reconnect_after(Duration::from_millis(20))
        .build();
    let endpoint = FakeEndpoint::new("A", &trace)
        .with_policy(policy)
        .otherwise(Resolution::Fail)
        .arc();
    let (mut manager, id) = single(&trace, endpoint);
    let connection = manager.connection(id).unwrap().clone();

    connection.connect();
    assert!(connection.timeout_armed());
    assert!(connection.reconnect_armed());

    assert_eq!(with_timeout(manager.next_completion()).await, Some(id));
    assert!(connection.attempts() > 2, "retried several times before the deadline");
    assert!(!connection.timeout_armed());

    // Retrying goes on after the forced completion, without a second report.
    let attempts = connection.attempts();
    assert_eq!(completions_within(&mut manager, Duration::from_millis(100)).await, 0);
    assert!(connection.attempts() > attempts);
    assert_eq!(trace.count("succeed(A)"), 0);
}

#[tokio::test]
async fn test_stale_link_is_ignored() {
    init_tracing();
    let trace = Trace::new();
    let endpoint = FakeEndpoint::new("A", &trace)
        .resolutions(&[Resolution::Manual, Resolution::Manual])
        .arc();
    let (mut manager, id) = single(&trace, endpoint.clone());
    let connection = manager.connection(id).unwrap().clone();

    connection.connect();
    let stale = endpoint.held_link().unwrap();
    connection.connect();

    assert!(!stale.is_current());
    assert_eq!(stale.connection_id(), Some(id));
    stale.succeeded();
    assert_eq!(connection.state(), ConnectionState::Connecting);

    endpoint.resolve(true);
    assert_eq!(connection.state(), ConnectionState::Succeeded);
    assert_eq!(completions_within(&mut manager, Duration::from_millis(50)).await, 1);
}

#[tokio::test]
async fn test_disconnect_stops_pending_reconnect() {
    init_tracing();
    let trace = Trace::new();
    let policy = PolicyBuilder::new()
        .reconnect_after(Duration::from_millis(40))
        .build();
    let endpoint = FakeEndpoint::new("A", &trace)
        .with_policy(policy)
        .otherwise(Resolution::Fail)
        .arc();
    let (manager, id) = single(&trace, endpoint);
    let connection = manager.connection(id).unwrap().clone();

    connection.connect();
    assert!(connection.reconnect_armed());
    connection.disconnect();

    sleep(Duration::from_millis(100)).await;
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert_eq!(connection.attempts(), 1);
    assert_eq!(trace.count("disconnect(A)"), 1);
}
