//! Protocol adapter and transport seams.
//!
//! An adapter is pure translation: it turns a [`GenerationRequest`] into a
//! [`WireRequest`] for one vendor and a [`WireResponse`] back into text.
//! The [`Transport`] moves bytes. The orchestrator composes the two and never
//! branches on the protocol itself.

use crate::error::ProtocolError;
use crate::provider::{ProtocolKind, ProviderConfig};
use crate::request::GenerationRequest;
use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;

/// Vendor-specific HTTP request produced by an adapter (always a POST)
#[derive(Clone)]
pub struct WireRequest {
    /// Absolute URL
    pub url: String,
    /// Request headers, including authentication
    pub headers: Vec<(String, String)>,
    /// JSON body
    pub body: serde_json::Value,
}

impl WireRequest {
    /// Create a request with a JSON body and no headers
    pub fn new(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value by case-insensitive name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Header values carry credentials
impl fmt::Debug for WireRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(n, _)| (n.as_str(), "[REDACTED]"))
            .collect();
        f.debug_struct("WireRequest")
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Raw vendor response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl WireResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Translation between the generic request and one vendor's wire format
pub trait ProtocolAdapter: Send + Sync {
    /// Protocol family handled by this adapter
    fn kind(&self) -> ProtocolKind;

    /// Build the vendor request, including authentication headers
    fn encode(
        &self,
        request: &GenerationRequest,
        provider: &ProviderConfig,
        credential: &SecretString,
    ) -> WireRequest;

    /// Extract the generated text from a vendor response
    ///
    /// # Errors
    /// Returns `ProtocolError::Http` for non-2xx statuses and
    /// `ProtocolError::Malformed` when the body fails the expected shape
    fn decode(&self, response: &WireResponse) -> Result<String, ProtocolError>;
}

/// Moves a wire request to the network and returns the raw response
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request
    ///
    /// Non-2xx statuses are returned as `Ok`; only failures to obtain a
    /// response at all are errors.
    async fn send(&self, request: WireRequest) -> Result<WireResponse, ProtocolError>;
}
