//! OpenAI-compatible chat completions adapter.
//!
//! POST `{endpoint}/chat/completions`, bearer authentication, text read from
//! `choices[0].message.content`. Works for any backend speaking this dialect.

use crate::common::{chat_messages, check_status, non_empty, parse_body, to_body, ChatMessage};
use relay_core::{
    GenerationRequest, ProtocolAdapter, ProtocolError, ProtocolKind, ProviderConfig, WireRequest,
    WireResponse,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Adapter for OpenAI-compatible backends
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiAdapter;

impl OpenAiAdapter {
    /// Create the adapter
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProtocolAdapter for OpenAiAdapter {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::OpenAi
    }

    fn encode(
        &self,
        request: &GenerationRequest,
        provider: &ProviderConfig,
        credential: &SecretString,
    ) -> WireRequest {
        let body = OpenAiRequest {
            model: &provider.model,
            messages: chat_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        WireRequest::new(
            provider.url_for("/chat/completions"),
            to_body(&body),
        )
        .with_header(
            "Authorization",
            format!("Bearer {}", credential.expose_secret()),
        )
    }

    fn decode(&self, response: &WireResponse) -> Result<String, ProtocolError> {
        check_status(response)?;
        let parsed: OpenAiResponse = parse_body(&response.body)?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProtocolError::malformed("no choices in response"))?
            .message
            .content
            .ok_or_else(|| ProtocolError::malformed("choices[0].message.content is null"))?;

        non_empty(content, "choices[0].message.content")
    }
}

// OpenAI API Types

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}
