//! Helpers shared by the protocol adapters.

use relay_core::{GenerationRequest, ProtocolError, WireResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Longest slice of a raw body kept in an error message
const MAX_ERROR_BODY: usize = 256;

/// Chat message used by the OpenAI-compatible and Cohere wire formats
#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Leading system message (when non-empty) followed by the user prompt
pub(crate) fn chat_messages(request: &GenerationRequest) -> Vec<ChatMessage<'_>> {
    let mut messages = Vec::with_capacity(2);
    if !request.system_message.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: &request.system_message,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &request.user_prompt,
    });
    messages
}

/// Serialize a wire body
///
/// A body that cannot be represented as JSON is logged and sent as `null`;
/// the vendor's rejection then surfaces as an ordinary attempt failure.
pub(crate) fn to_body<T: Serialize>(body: &T) -> Value {
    serde_json::to_value(body).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to serialize request body");
        Value::Null
    })
}

/// Turn a non-2xx response into `ProtocolError::Http`
pub(crate) fn check_status(response: &WireResponse) -> Result<(), ProtocolError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ProtocolError::http(
            response.status,
            error_message(&response.body),
        ))
    }
}

/// Best-effort message from a vendor error envelope
///
/// Understands `{"error":{"message":..}}`, `{"message":..}` and
/// `{"error":".."}`; anything else yields the (truncated) raw body.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            value.pointer("/error/message"),
            value.get("message"),
            value.get("error"),
        ];
        if let Some(message) = candidates
            .into_iter()
            .flatten()
            .find_map(serde_json::Value::as_str)
        {
            return message.to_string();
        }
    }
    truncate(body.trim(), MAX_ERROR_BODY)
}

/// Deserialize a success body into the vendor's response type
pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ProtocolError> {
    serde_json::from_str(body).map_err(|e| ProtocolError::malformed(e.to_string()))
}

/// Reject an empty decoded text
pub(crate) fn non_empty(text: String, location: &str) -> Result<String, ProtocolError> {
    if text.is_empty() {
        Err(ProtocolError::malformed(format!("empty text at {location}")))
    } else {
        Ok(text)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
