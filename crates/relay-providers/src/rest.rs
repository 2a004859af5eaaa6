//! Bespoke REST adapter.
//!
//! For in-house or niche backends that speak none of the vendor dialects.
//! The request body is fixed (`model`, `system`, `prompt`, `max_tokens`,
//! `temperature`); path, auth header and response location come from the
//! provider's [`RestShape`].

use crate::common::{check_status, non_empty, parse_body, to_body};
use relay_core::{
    GenerationRequest, ProtocolAdapter, ProtocolError, ProtocolKind, ProviderConfig, RestShape,
    WireRequest, WireResponse,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Adapter bound to one provider's REST shape
#[derive(Debug, Clone)]
pub struct RestAdapter {
    shape: RestShape,
}

impl RestAdapter {
    /// Create an adapter for a shape
    #[must_use]
    pub fn new(shape: RestShape) -> Self {
        Self { shape }
    }
}

impl ProtocolAdapter for RestAdapter {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Rest
    }

    fn encode(
        &self,
        request: &GenerationRequest,
        provider: &ProviderConfig,
        credential: &SecretString,
    ) -> WireRequest {
        let body = RestRequest {
            model: &provider.model,
            system: &request.system_message,
            prompt: &request.user_prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        WireRequest::new(
            provider.url_for(&self.shape.path),
            to_body(&body),
        )
        .with_header(
            self.shape.auth_header.as_str(),
            format!("{}{}", self.shape.auth_prefix, credential.expose_secret()),
        )
    }

    fn decode(&self, response: &WireResponse) -> Result<String, ProtocolError> {
        check_status(response)?;
        let value: serde_json::Value = parse_body(&response.body)?;
        let pointer = &self.shape.response_pointer;

        let text = value
            .pointer(pointer)
            .ok_or_else(|| ProtocolError::malformed(format!("nothing at '{pointer}'")))?
            .as_str()
            .ok_or_else(|| ProtocolError::malformed(format!("'{pointer}' is not a string")))?;

        non_empty(text.to_string(), pointer)
    }
}

#[derive(Debug, Serialize)]
struct RestRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
}
