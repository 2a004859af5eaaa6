//! Vendor wire format tests through the real HTTP transport

use crate::{assert_outcomes, request, MockVendor, TestRelay};
use relay_core::{AttemptOutcome, ErrorKind};
use serde_json::json;

#[tokio::test]
async fn test_openai_round_trip() {
    let vendor = MockVendor::openai().await;
    vendor
        .mock_success_matching(
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "Be brief"},
                    {"role": "user", "content": "Hello"}
                ]
            }),
            "Hi from OpenAI",
        )
        .await;

    let relay = TestRelay::uncached(vec![vendor.provider("openai")]);
    let result = relay
        .run(&request("Hello").with_system_message("Be brief"))
        .await;

    assert!(result.success, "{result:#?}");
    assert_eq!(result.response.as_deref(), Some("Hi from OpenAI"));
    assert_eq!(result.provider_used.as_deref(), Some("openai"));
    assert_outcomes(&result, &[("openai", AttemptOutcome::Success)]);
}

#[tokio::test]
async fn test_openai_omits_empty_system_message() {
    let vendor = MockVendor::openai().await;
    vendor.mock_success("ok").await;

    let relay = TestRelay::uncached(vec![vendor.provider("openai")]);
    assert!(relay.run(&request("Hello")).await.success);

    let body = vendor.last_body().await.expect("request body");
    let messages = body["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
}

#[tokio::test]
async fn test_google_folds_system_message_into_prompt() {
    let vendor = MockVendor::google().await;
    vendor
        .mock_success_matching(
            json!({"contents": [{"parts": [{"text": "Rules\n\nQuestion"}]}]}),
            "Gemini answer",
        )
        .await;

    let relay = TestRelay::uncached(vec![vendor.provider("gemini")]);
    let result = relay
        .run(&request("Question").with_system_message("Rules"))
        .await;

    assert!(result.success, "{result:#?}");
    assert_eq!(result.response.as_deref(), Some("Gemini answer"));
}

#[tokio::test]
async fn test_google_sends_generation_config() {
    let vendor = MockVendor::google().await;
    vendor.mock_success("ok").await;

    let relay = TestRelay::uncached(vec![vendor.provider("gemini")]);
    relay
        .run(&request("Question").with_max_tokens(77))
        .await;

    let body = vendor.last_body().await.expect("request body");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 77);
}

#[tokio::test]
async fn test_cohere_round_trip() {
    let vendor = MockVendor::cohere().await;
    vendor
        .mock_success_matching(json!({"model": "command-r"}), "Cohere reply")
        .await;

    let relay = TestRelay::uncached(vec![vendor.provider("cohere")]);
    let result = relay.run(&request("Hello")).await;

    assert_eq!(result.response.as_deref(), Some("Cohere reply"));
    assert_outcomes(&result, &[("cohere", AttemptOutcome::Success)]);
}

#[tokio::test]
async fn test_rest_reads_text_at_pointer() {
    let vendor = MockVendor::rest().await;
    vendor.mock_success("internal model text").await;

    let relay = TestRelay::uncached(vec![vendor.provider("internal")]);
    let result = relay.run(&request("Hello")).await;

    assert_eq!(result.response.as_deref(), Some("internal model text"));
}

#[tokio::test]
async fn test_malformed_body_is_reported() {
    let vendor = MockVendor::cohere().await;
    vendor.mock_malformed().await;

    let relay = TestRelay::uncached(vec![vendor.provider("cohere")]);
    let result = relay.run(&request("Hello")).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::AllProvidersFailed));
    assert_eq!(result.last_attempt_error, Some(ErrorKind::MalformedResponse));
    assert_eq!(result.attempts[0].error_kind, Some(ErrorKind::MalformedResponse));
}

#[tokio::test]
async fn test_vendor_error_message_is_kept() {
    let vendor = MockVendor::openai().await;
    vendor.mock_error(503, "overloaded").await;

    let relay = TestRelay::uncached(vec![vendor.provider("openai")]);
    let result = relay.run(&request("Hello")).await;

    let attempt = &result.attempts[0];
    assert_eq!(attempt.outcome, AttemptOutcome::Failure);
    assert_eq!(attempt.error_kind, Some(ErrorKind::HttpError));
    let message = attempt.error_message.as_deref().unwrap_or_default();
    assert!(message.contains("503"), "{message}");
    assert!(message.contains("overloaded"), "{message}");
}

#[tokio::test]
async fn test_unreachable_vendor_is_http_error() {
    let vendor = MockVendor::openai().await;
    let provider = vendor.provider("openai");
    drop(vendor);

    let relay = TestRelay::uncached(vec![provider]);
    let result = relay.run(&request("Hello")).await;

    assert!(!result.success);
    assert_eq!(result.last_attempt_error, Some(ErrorKind::HttpError));
}
