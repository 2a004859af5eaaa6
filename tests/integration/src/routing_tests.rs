//! Fallback, circuit breaking and timeout tests

use crate::{assert_outcomes, request, MockVendor, TestRelay};
use relay_core::{AttemptOutcome, ErrorKind};
use relay_resilience::CircuitState;
use std::time::Duration;

#[tokio::test]
async fn test_fallback_on_server_error() {
    let primary = MockVendor::openai().await;
    let secondary = MockVendor::cohere().await;
    primary.mock_error(500, "internal").await;
    secondary.mock_success("from cohere").await;

    let relay = TestRelay::uncached(vec![
        primary.provider("openai").with_priority(1),
        secondary.provider("cohere").with_priority(2),
    ]);
    let result = relay.run(&request("Hello")).await;

    assert!(result.success);
    assert_eq!(result.provider_used.as_deref(), Some("cohere"));
    assert_eq!(result.response.as_deref(), Some("from cohere"));
    assert_eq!(result.last_attempt_error, Some(ErrorKind::HttpError));
    assert_outcomes(
        &result,
        &[
            ("openai", AttemptOutcome::Failure),
            ("cohere", AttemptOutcome::Success),
        ],
    );
    assert_eq!(primary.calls().await, 1);
    assert_eq!(secondary.calls().await, 1);
}

#[tokio::test]
async fn test_success_stops_the_chain() {
    let primary = MockVendor::google().await;
    let secondary = MockVendor::openai().await;
    primary.mock_success("gemini first").await;
    secondary.mock_success("never").await;

    let relay = TestRelay::uncached(vec![
        secondary.provider("openai").with_priority(5),
        primary.provider("gemini").with_priority(1),
    ]);
    let result = relay.run(&request("Hello")).await;

    assert_eq!(result.provider_used.as_deref(), Some("gemini"));
    assert_eq!(secondary.calls().await, 0);
}

#[tokio::test]
async fn test_exact_capability_is_preferred() {
    let generalist = MockVendor::openai().await;
    let specialist = MockVendor::rest().await;
    generalist.mock_success("generic").await;
    specialist.mock_success("specialised").await;

    let relay = TestRelay::uncached(vec![
        generalist.provider("openai").with_priority(1),
        specialist
            .provider("reviewer")
            .with_capability("code_review")
            .with_priority(9),
    ]);

    assert_eq!(
        relay.orchestrator.chain_for("code_review"),
        vec!["reviewer", "openai"]
    );
    let result = relay
        .orchestrator
        .orchestrate(
            &relay_core::GenerationRequest::new("code_review", "diff"),
            None,
        )
        .await;
    assert_eq!(result.response.as_deref(), Some("specialised"));
}

#[tokio::test]
async fn test_all_providers_failed() {
    let a = MockVendor::openai().await;
    let b = MockVendor::cohere().await;
    a.mock_error(502, "bad gateway").await;
    b.mock_malformed().await;

    let relay = TestRelay::uncached(vec![
        a.provider("openai").with_priority(1),
        b.provider("cohere").with_priority(2),
    ]);
    let result = relay.run(&request("Hello")).await;

    assert!(!result.success);
    assert!(result.response.is_none());
    assert!(result.provider_used.is_none());
    assert_eq!(result.error_kind, Some(ErrorKind::AllProvidersFailed));
    assert_eq!(result.last_attempt_error, Some(ErrorKind::MalformedResponse));
    assert_eq!(result.attempts.len(), 2);
}

#[tokio::test]
async fn test_no_provider_serves_task_type() {
    let vendor = MockVendor::openai().await;
    let mut provider = vendor.provider("openai");
    provider.capabilities = vec!["translation".to_string()];

    let relay = TestRelay::uncached(vec![provider]);
    let result = relay.run(&request("Hello")).await;

    assert_eq!(result.error_kind, Some(ErrorKind::NoProviders));
    assert!(result.attempts.is_empty());
    assert_eq!(vendor.calls().await, 0);
}

#[tokio::test]
async fn test_circuit_opens_and_skips_vendor() {
    let flaky = MockVendor::openai().await;
    let backup = MockVendor::cohere().await;
    flaky.mock_error(500, "down").await;
    backup.mock_success("backup").await;

    let relay = TestRelay::uncached(vec![
        flaky.provider("openai").with_priority(1).with_circuit(2, 60_000),
        backup.provider("cohere").with_priority(2),
    ]);

    for _ in 0..2 {
        assert!(relay.run(&request("Hello")).await.success);
    }
    let health = relay.orchestrator.health().snapshot("openai").expect("registered");
    assert_eq!(health.state, CircuitState::Open);

    let result = relay.run(&request("Hello")).await;
    assert_outcomes(
        &result,
        &[
            ("openai", AttemptOutcome::SkippedCircuit),
            ("cohere", AttemptOutcome::Success),
        ],
    );
    assert_eq!(flaky.calls().await, 2);
    assert_eq!(backup.calls().await, 3);
}

#[tokio::test]
async fn test_circuit_recovers_after_cooldown() {
    let vendor = MockVendor::openai().await;
    vendor.mock_error(500, "down").await;

    let relay = TestRelay::uncached(vec![vendor
        .provider("openai")
        .with_circuit(1, 100)]);

    assert!(!relay.run(&request("Hello")).await.success);
    assert_outcomes(
        &relay.run(&request("Hello")).await,
        &[("openai", AttemptOutcome::SkippedCircuit)],
    );

    vendor.server.reset().await;
    vendor.mock_success("recovered").await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let result = relay.run(&request("Hello")).await;
    assert_eq!(result.response.as_deref(), Some("recovered"));
    let health = relay.orchestrator.health().snapshot("openai").expect("registered");
    assert_eq!(health.state, CircuitState::Closed);
    assert_eq!(health.consecutive_failures, 0);
}

#[tokio::test]
async fn test_slow_vendor_times_out_and_falls_back() {
    let slow = MockVendor::google().await;
    let fast = MockVendor::openai().await;
    slow.mock_delayed("too late", Duration::from_secs(2)).await;
    fast.mock_success("in time").await;

    let relay = TestRelay::uncached(vec![
        slow.provider("gemini").with_priority(1).with_timeout_ms(200),
        fast.provider("openai").with_priority(2),
    ]);
    let result = relay.run(&request("Hello")).await;

    assert_eq!(result.response.as_deref(), Some("in time"));
    let timed_out = &result.attempts[0];
    assert_eq!(timed_out.error_kind, Some(ErrorKind::Timeout));
    assert!(timed_out.duration_ms >= 200, "{timed_out:?}");
    assert!(timed_out.duration_ms < 2_000, "{timed_out:?}");
}

#[tokio::test]
async fn test_deadline_abandons_the_chain() {
    let slow = MockVendor::google().await;
    let next = MockVendor::openai().await;
    slow.mock_delayed("too late", Duration::from_secs(2)).await;
    next.mock_success("unreached").await;

    let relay = TestRelay::uncached(vec![
        slow.provider("gemini").with_priority(1).with_circuit(1, 60_000),
        next.provider("openai").with_priority(2),
    ]);
    let result = relay
        .orchestrator
        .orchestrate(&request("Hello"), Some(Duration::from_millis(300)))
        .await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::DeadlineExceeded));
    assert_eq!(result.attempts.len(), 1);
    assert_eq!(
        result.attempts[0].error_kind,
        Some(ErrorKind::DeadlineExceeded)
    );
    assert!(result.total_duration_ms >= 300);
    assert_eq!(next.calls().await, 0);

    // The caller's deadline is not the provider's fault
    let health = relay.orchestrator.health().snapshot("gemini").expect("registered");
    assert_eq!(health.state, CircuitState::Closed);
}

#[tokio::test]
async fn test_one_metrics_event_per_call() {
    let a = MockVendor::openai().await;
    let b = MockVendor::cohere().await;
    a.mock_error(500, "down").await;
    b.mock_success("ok").await;

    let relay = TestRelay::uncached(vec![
        a.provider("openai").with_priority(1),
        b.provider("cohere").with_priority(2),
    ]);
    relay.run(&request("one")).await;
    relay.run(&request("two")).await;

    let events = relay.metrics.events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.success));
    assert_eq!(events[0].provider_used.as_deref(), Some("cohere"));
    assert_eq!(events[0].attempts_count, 2);
}
