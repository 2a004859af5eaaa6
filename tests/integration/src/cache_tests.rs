//! Response cache behaviour across the whole call path

use crate::{request, MockVendor, TestRelay};
use relay_core::{AttemptOutcome, CACHE_PROVIDER};

#[tokio::test]
async fn test_repeat_request_is_served_from_cache() {
    let vendor = MockVendor::openai().await;
    vendor.mock_success("expensive answer").await;

    let relay = TestRelay::new(vec![vendor.provider("openai")]);
    let first = relay.run(&request("What is Rust?")).await;
    let second = relay.run(&request("What is Rust?")).await;

    assert_eq!(first.provider_used.as_deref(), Some("openai"));
    assert!(second.is_cache_hit());
    assert_eq!(second.provider_used.as_deref(), Some(CACHE_PROVIDER));
    assert_eq!(second.response, first.response);
    assert!(second.attempts.is_empty());
    assert_eq!(vendor.calls().await, 1);

    let stats = relay.orchestrator.cache().expect("cache enabled").stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.writes, 1);
}

#[tokio::test]
async fn test_cache_hit_leaves_provider_state_alone() {
    let vendor = MockVendor::cohere().await;
    vendor.mock_success("answer").await;

    let relay = TestRelay::new(vec![vendor
        .provider("cohere")
        .with_rate_limit_per_minute(5)]);
    relay.run(&request("prompt")).await;
    let remaining = relay.orchestrator.rate_limiter().remaining("cohere");

    for _ in 0..3 {
        assert!(relay.run(&request("prompt")).await.is_cache_hit());
    }

    assert_eq!(relay.orchestrator.rate_limiter().remaining("cohere"), remaining);
    assert_eq!(remaining, Some(4));
}

#[tokio::test]
async fn test_different_parameters_miss_the_cache() {
    let vendor = MockVendor::google().await;
    vendor.mock_success("answer").await;

    let relay = TestRelay::new(vec![vendor.provider("gemini")]);
    relay.run(&request("prompt")).await;
    relay.run(&request("prompt").with_temperature(0.1)).await;
    relay.run(&request("prompt").with_system_message("terse")).await;

    assert_eq!(vendor.calls().await, 3);
}

#[tokio::test]
async fn test_uncacheable_request_always_reaches_vendor() {
    let vendor = MockVendor::openai().await;
    vendor.mock_success("fresh").await;

    let relay = TestRelay::new(vec![vendor.provider("openai")]);
    let req = request("prompt").with_cacheable(false);
    relay.run(&req).await;
    let second = relay.run(&req).await;

    assert_eq!(second.outcomes(), vec![("openai", AttemptOutcome::Success)]);
    assert_eq!(vendor.calls().await, 2);
    assert_eq!(relay.orchestrator.cache().expect("cache enabled").stats().writes, 0);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let vendor = MockVendor::openai().await;
    vendor.mock_error(500, "down").await;

    let relay = TestRelay::new(vec![vendor.provider("openai")]);
    relay.run(&request("prompt")).await;
    let second = relay.run(&request("prompt")).await;

    assert!(!second.success);
    assert!(!second.is_cache_hit());
    assert_eq!(vendor.calls().await, 2);
}

#[tokio::test]
async fn test_disabled_cache() {
    let vendor = MockVendor::rest().await;
    vendor.mock_success("answer").await;

    let relay = TestRelay::uncached(vec![vendor.provider("internal")]);
    relay.run(&request("prompt")).await;
    relay.run(&request("prompt")).await;

    assert!(relay.orchestrator.cache().is_none());
    assert_eq!(vendor.calls().await, 2);
}
