//! Google Generative Language (Gemini) adapter.
//!
//! POST `{endpoint}/models/{model}:generateContent` with the key in the
//! `x-goog-api-key` header. The wire contract has a single text part, so a
//! non-empty system message is folded into it ahead of the user prompt.

use crate::common::{check_status, non_empty, parse_body, to_body};
use relay_core::{
    GenerationRequest, ProtocolAdapter, ProtocolError, ProtocolKind, ProviderConfig, WireRequest,
    WireResponse,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Adapter for the Google Generative Language API
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleAdapter;

impl GoogleAdapter {
    /// Create the adapter
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn prompt_text(request: &GenerationRequest) -> String {
        if request.system_message.is_empty() {
            request.user_prompt.clone()
        } else {
            format!("{}\n\n{}", request.system_message, request.user_prompt)
        }
    }
}

impl ProtocolAdapter for GoogleAdapter {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Google
    }

    fn encode(
        &self,
        request: &GenerationRequest,
        provider: &ProviderConfig,
        credential: &SecretString,
    ) -> WireRequest {
        let body = GoogleRequest {
            contents: vec![GoogleContent {
                parts: vec![GooglePart {
                    text: Self::prompt_text(request),
                }],
            }],
            generation_config: GoogleGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        WireRequest::new(
            provider.url_for(&format!("/models/{}:generateContent", provider.model)),
            to_body(&body),
        )
        .with_header(API_KEY_HEADER, credential.expose_secret().as_str())
    }

    fn decode(&self, response: &WireResponse) -> Result<String, ProtocolError> {
        check_status(response)?;
        let parsed: GoogleResponse = parse_body(&response.body)?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProtocolError::malformed("no candidates in response"))?
            .content
            .ok_or_else(|| ProtocolError::malformed("candidate has no content"))?
            .parts
            .into_iter()
            .next()
            .ok_or_else(|| ProtocolError::malformed("candidate content has no parts"))?
            .text;

        non_empty(text, "candidates[0].content.parts[0].text")
    }
}

// Google API Types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleRequest {
    contents: Vec<GoogleContent>,
    generation_config: GoogleGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GoogleContent {
    parts: Vec<GooglePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GooglePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleGenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Debug, Deserialize)]
struct GoogleCandidate {
    #[serde(default)]
    content: Option<GoogleContent>,
}
