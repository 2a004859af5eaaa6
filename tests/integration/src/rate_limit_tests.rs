//! Rate limiting tests

use crate::{assert_outcomes, request, MockVendor, TestRelay};
use relay_core::{AttemptOutcome, ErrorKind};
use relay_resilience::CircuitState;

#[tokio::test]
async fn test_exhausted_window_skips_to_next_provider() {
    let limited = MockVendor::openai().await;
    let backup = MockVendor::google().await;
    limited.mock_success("limited").await;
    backup.mock_success("backup").await;

    let relay = TestRelay::uncached(vec![
        limited
            .provider("openai")
            .with_priority(1)
            .with_rate_limit_per_minute(2),
        backup.provider("gemini").with_priority(2),
    ]);

    for _ in 0..2 {
        let result = relay.run(&request("Hello")).await;
        assert_eq!(result.provider_used.as_deref(), Some("openai"));
    }

    let result = relay.run(&request("Hello")).await;
    assert_outcomes(
        &result,
        &[
            ("openai", AttemptOutcome::SkippedRateLimit),
            ("gemini", AttemptOutcome::Success),
        ],
    );
    assert_eq!(limited.calls().await, 2);
    assert_eq!(relay.orchestrator.rate_limiter().remaining("openai"), Some(0));
}

#[tokio::test]
async fn test_rate_limit_skip_is_not_a_failure() {
    let vendor = MockVendor::cohere().await;
    vendor.mock_success("ok").await;

    let relay = TestRelay::uncached(vec![vendor
        .provider("cohere")
        .with_rate_limit_per_minute(1)
        .with_circuit(1, 60_000)]);

    assert!(relay.run(&request("Hello")).await.success);
    for _ in 0..3 {
        let result = relay.run(&request("Hello")).await;
        assert_eq!(result.error_kind, Some(ErrorKind::AllProvidersFailed));
        assert_eq!(result.last_attempt_error, None);
        assert_outcomes(&result, &[("cohere", AttemptOutcome::SkippedRateLimit)]);
    }

    let health = relay.orchestrator.health().snapshot("cohere").expect("registered");
    assert_eq!(health.state, CircuitState::Closed);
    assert_eq!(health.consecutive_failures, 0);
    assert_eq!(vendor.calls().await, 1);
}

#[tokio::test]
async fn test_failed_attempts_consume_the_window() {
    let vendor = MockVendor::openai().await;
    vendor.mock_error(500, "down").await;

    let relay = TestRelay::uncached(vec![vendor
        .provider("openai")
        .with_rate_limit_per_minute(3)]);
    relay.run(&request("Hello")).await;

    assert_eq!(relay.orchestrator.rate_limiter().remaining("openai"), Some(2));
}

#[tokio::test]
async fn test_providers_have_independent_windows() {
    let a = MockVendor::openai().await;
    let b = MockVendor::cohere().await;
    a.mock_success("a").await;
    b.mock_success("b").await;

    let relay = TestRelay::uncached(vec![
        a.provider("openai").with_priority(1).with_rate_limit_per_minute(1),
        b.provider("cohere").with_priority(2).with_rate_limit_per_minute(1),
    ]);

    assert_eq!(relay.run(&request("1")).await.provider_used.as_deref(), Some("openai"));
    assert_eq!(relay.run(&request("2")).await.provider_used.as_deref(), Some("cohere"));

    let third = relay.run(&request("3")).await;
    assert!(!third.success);
    assert_eq!(third.attempts.len(), 2);
}
