//! Mock LLM vendors for integration testing
//!
//! One wiremock server per vendor, speaking that vendor's wire format. Auth
//! headers are matched, so a request carrying the wrong credential gets
//! wiremock's default 404.

use crate::fixtures::{
    cohere_response, error_response, google_response, openai_response, rest_response, COHERE_KEY,
    COHERE_KEY_REF, GOOGLE_KEY, GOOGLE_KEY_REF, OPENAI_KEY, OPENAI_KEY_REF, REST_KEY,
    REST_KEY_REF, REST_POINTER,
};
use relay_core::{ProtocolKind, ProviderConfig, RestShape};
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

/// A mock vendor server for one protocol
pub struct MockVendor {
    pub server: MockServer,
    protocol: ProtocolKind,
    model: String,
}

impl MockVendor {
    /// Start a mock speaking `protocol` for `model`
    pub async fn start(protocol: ProtocolKind, model: &str) -> Self {
        Self {
            server: MockServer::start().await,
            protocol,
            model: model.to_string(),
        }
    }

    /// OpenAI-compatible chat completions mock
    pub async fn openai() -> Self {
        Self::start(ProtocolKind::OpenAi, "gpt-4o-mini").await
    }

    /// Google generateContent mock
    pub async fn google() -> Self {
        Self::start(ProtocolKind::Google, "gemini-1.5-flash").await
    }

    /// Cohere chat mock
    pub async fn cohere() -> Self {
        Self::start(ProtocolKind::Cohere, "command-r").await
    }

    /// Bespoke REST backend mock
    pub async fn rest() -> Self {
        Self::start(ProtocolKind::Rest, "internal-7b").await
    }

    /// Endpoint a provider record should point at
    pub fn endpoint(&self) -> String {
        let base = self.server.uri();
        match self.protocol {
            ProtocolKind::OpenAi => format!("{base}/v1"),
            ProtocolKind::Google => format!("{base}/v1beta"),
            ProtocolKind::Cohere => format!("{base}/v2"),
            ProtocolKind::Rest => base,
        }
    }

    /// Request path the vendor serves
    pub fn route(&self) -> String {
        match self.protocol {
            ProtocolKind::OpenAi => "/v1/chat/completions".to_string(),
            ProtocolKind::Google => format!("/v1beta/models/{}:generateContent", self.model),
            ProtocolKind::Cohere => "/v2/chat".to_string(),
            ProtocolKind::Rest => "/generate".to_string(),
        }
    }

    /// Provider record serving `general`, pointed at this mock
    pub fn provider(&self, id: &str) -> ProviderConfig {
        let config = ProviderConfig::new(id, self.protocol, self.endpoint(), self.model.clone())
            .with_capability("general")
            .with_credential_ref(self.credential_ref())
            .with_timeout_ms(2_000);
        match self.protocol {
            ProtocolKind::Rest => config.with_rest_shape(RestShape::new(REST_POINTER)),
            _ => config,
        }
    }

    fn credential_ref(&self) -> &'static str {
        match self.protocol {
            ProtocolKind::OpenAi => OPENAI_KEY_REF,
            ProtocolKind::Google => GOOGLE_KEY_REF,
            ProtocolKind::Cohere => COHERE_KEY_REF,
            ProtocolKind::Rest => REST_KEY_REF,
        }
    }

    fn success_body(&self, text: &str) -> Value {
        match self.protocol {
            ProtocolKind::OpenAi => openai_response(&self.model, text),
            ProtocolKind::Google => google_response(text),
            ProtocolKind::Cohere => cohere_response(text),
            ProtocolKind::Rest => rest_response(text),
        }
    }

    /// POST on the vendor route carrying the expected credential
    fn authorized(&self) -> MockBuilder {
        let builder = Mock::given(method("POST")).and(path(self.route()));
        match self.protocol {
            ProtocolKind::OpenAi => builder.and(header("authorization", format!("Bearer {OPENAI_KEY}"))),
            ProtocolKind::Google => builder.and(header("x-goog-api-key", GOOGLE_KEY)),
            ProtocolKind::Cohere => builder.and(header("authorization", format!("Bearer {COHERE_KEY}"))),
            ProtocolKind::Rest => builder.and(header("authorization", format!("Bearer {REST_KEY}"))),
        }
    }

    /// Answer every request with `text`
    pub async fn mock_success(&self, text: &str) {
        self.authorized()
            .respond_with(ResponseTemplate::new(200).set_body_json(self.success_body(text)))
            .mount(&self.server)
            .await;
    }

    /// Answer with `text` only when the body contains `expected`
    pub async fn mock_success_matching(&self, expected: Value, text: &str) {
        self.authorized()
            .and(body_partial_json(expected))
            .respond_with(ResponseTemplate::new(200).set_body_json(self.success_body(text)))
            .mount(&self.server)
            .await;
    }

    /// Answer with `text` after `delay`
    pub async fn mock_delayed(&self, text: &str, delay: Duration) {
        self.authorized()
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(self.success_body(text))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer every request with an error status
    pub async fn mock_error(&self, status: u16, message: &str) {
        self.authorized()
            .respond_with(ResponseTemplate::new(status).set_body_json(error_response(message)))
            .mount(&self.server)
            .await;
    }

    /// Answer with a 200 whose body is not in the vendor's shape
    pub async fn mock_malformed(&self) {
        self.authorized()
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the vendor has received
    pub async fn calls(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    /// JSON body of the most recent request
    pub async fn last_body(&self) -> Option<Value> {
        self.server
            .received_requests()
            .await?
            .last()
            .and_then(|request| serde_json::from_slice(&request.body).ok())
    }
}
