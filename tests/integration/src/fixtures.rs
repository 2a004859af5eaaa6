//! Test fixtures: vendor response bodies and credentials

use relay_config::StaticCredentialResolver;
use serde_json::{json, Value};

/// Credential reference and key for the OpenAI mock
pub const OPENAI_KEY_REF: &str = "OPENAI_API_KEY";
pub const OPENAI_KEY: &str = "sk-test-openai";

/// Credential reference and key for the Google mock
pub const GOOGLE_KEY_REF: &str = "GOOGLE_API_KEY";
pub const GOOGLE_KEY: &str = "g-test-key";

/// Credential reference and key for the Cohere mock
pub const COHERE_KEY_REF: &str = "COHERE_API_KEY";
pub const COHERE_KEY: &str = "co-test-key";

/// Credential reference and key for the bespoke REST mock
pub const REST_KEY_REF: &str = "INTERNAL_LLM_TOKEN";
pub const REST_KEY: &str = "rest-test-token";

/// JSON pointer the REST mock answers at
pub const REST_POINTER: &str = "/output/text";

/// Resolver knowing every mock vendor's credential
pub fn credentials() -> StaticCredentialResolver {
    StaticCredentialResolver::new()
        .with_credential(OPENAI_KEY_REF, OPENAI_KEY)
        .with_credential(GOOGLE_KEY_REF, GOOGLE_KEY)
        .with_credential(COHERE_KEY_REF, COHERE_KEY)
        .with_credential(REST_KEY_REF, REST_KEY)
}

/// OpenAI chat completion body
pub fn openai_response(model: &str, content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

/// Google generateContent body
pub fn google_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
    })
}

/// Cohere chat body
pub fn cohere_response(text: &str) -> Value {
    json!({
        "text": text,
        "generation_id": "gen-test",
        "finish_reason": "COMPLETE"
    })
}

/// Bespoke REST body with the text at [`REST_POINTER`]
pub fn rest_response(text: &str) -> Value {
    json!({
        "output": {"text": text, "tokens": 5},
        "latency_ms": 12
    })
}

/// Vendor error envelope
pub fn error_response(message: &str) -> Value {
    json!({
        "error": {"message": message, "type": "server_error"}
    })
}
