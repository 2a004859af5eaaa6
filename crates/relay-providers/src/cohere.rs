//! Cohere chat adapter.
//!
//! POST `{endpoint}/chat` with bearer authentication; the generated text is
//! the top-level `text` field.

use crate::common::{chat_messages, check_status, non_empty, parse_body, to_body, ChatMessage};
use relay_core::{
    GenerationRequest, ProtocolAdapter, ProtocolError, ProtocolKind, ProviderConfig, WireRequest,
    WireResponse,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Adapter for the Cohere chat API
#[derive(Debug, Clone, Copy, Default)]
pub struct CohereAdapter;

impl CohereAdapter {
    /// Create the adapter
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProtocolAdapter for CohereAdapter {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Cohere
    }

    fn encode(
        &self,
        request: &GenerationRequest,
        provider: &ProviderConfig,
        credential: &SecretString,
    ) -> WireRequest {
        let body = CohereRequest {
            model: &provider.model,
            messages: chat_messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        WireRequest::new(
            provider.url_for("/chat"),
            to_body(&body),
        )
        .with_header(
            "Authorization",
            format!("Bearer {}", credential.expose_secret()),
        )
    }

    fn decode(&self, response: &WireResponse) -> Result<String, ProtocolError> {
        check_status(response)?;
        let parsed: CohereResponse = parse_body(&response.body)?;
        let text = parsed
            .text
            .ok_or_else(|| ProtocolError::malformed("missing 'text' field"))?;
        non_empty(text, "text")
    }
}

#[derive(Debug, Serialize)]
struct CohereRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CohereResponse {
    #[serde(default)]
    text: Option<String>,
}
