//! reqwest-backed [`Transport`].

use async_trait::async_trait;
use relay_core::{ProtocolError, RelayError, RelayResult, Transport, WireRequest, WireResponse};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, trace};

/// HTTP transport sharing one connection pool across all providers
///
/// Timeouts are not configured here: the orchestrator bounds every attempt
/// with the provider's own timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with a pooled rustls client
    ///
    /// # Errors
    /// Returns `RelayError::Internal` if the HTTP client cannot be built
    pub fn new() -> RelayResult<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(100)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("llm-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, ProtocolError> {
        let WireRequest { url, headers, body } = request;

        let mut builder = self.client.post(&url).json(&body);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            debug!(url = %url, error = %e, "HTTP request failed");
            ProtocolError::transport(format!("Request failed: {e}"))
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProtocolError::transport(format!("Failed to read response: {e}")))?;

        trace!(url = %url, status, body_len = body.len(), "Received provider response");

        Ok(WireResponse::new(status, body))
    }
}
