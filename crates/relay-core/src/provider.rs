//! Provider configuration.
//!
//! A [`ProviderConfig`] is immutable after load. It carries no secret: the
//! `credential_ref` is an opaque lookup key resolved once at registry build time.

use crate::error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Capability tag every generic provider declares
pub const GENERAL_CAPABILITY: &str = "general";

/// Wire protocol family, selects the adapter bound to a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    /// OpenAI-compatible chat completions
    OpenAi,
    /// Google Generative Language (Gemini)
    Google,
    /// Cohere chat
    Cohere,
    /// Bespoke REST shape described by a [`RestShape`]
    Rest,
}

impl ProtocolKind {
    /// Get the protocol name as a string
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Cohere => "cohere",
            Self::Rest => "rest",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response shape of a bespoke REST backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RestShape {
    /// Path appended to the provider endpoint
    #[serde(default = "default_rest_path")]
    #[validate(length(min = 1))]
    pub path: String,
    /// Header carrying the credential
    #[serde(default = "default_auth_header")]
    #[validate(length(min = 1))]
    pub auth_header: String,
    /// Prefix placed before the credential in the auth header value
    #[serde(default = "default_auth_prefix")]
    pub auth_prefix: String,
    /// JSON pointer (RFC 6901) to the generated text in the response body
    #[validate(length(min = 1))]
    pub response_pointer: String,
}

impl RestShape {
    /// Create a shape reading the text at `response_pointer`
    pub fn new(response_pointer: impl Into<String>) -> Self {
        Self {
            path: default_rest_path(),
            auth_header: default_auth_header(),
            auth_prefix: default_auth_prefix(),
            response_pointer: response_pointer.into(),
        }
    }

    /// Set the request path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the auth header name and value prefix
    #[must_use]
    pub fn with_auth(mut self, header: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.auth_header = header.into();
        self.auth_prefix = prefix.into();
        self
    }
}

fn default_rest_path() -> String {
    "/generate".to_string()
}

fn default_auth_header() -> String {
    "Authorization".to_string()
}

fn default_auth_prefix() -> String {
    "Bearer ".to_string()
}

fn default_priority() -> i32 {
    100
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_rate_limit() -> u32 {
    60
}

fn default_max_failures() -> u32 {
    3
}

fn default_cooldown_ms() -> u64 {
    60_000
}

/// One configured remote text-generation backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProviderConfig {
    /// Unique provider identifier
    #[validate(length(min = 1))]
    pub id: String,

    /// Human-readable name, defaults to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Protocol family selecting the adapter
    pub protocol: ProtocolKind,

    /// Base URL
    #[validate(url)]
    pub endpoint: String,

    /// Opaque credential lookup key, never the secret itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,

    /// Backend-specific model identifier
    #[validate(length(min = 1))]
    pub model: String,

    /// Task-type tags this provider can serve
    #[validate(length(min = 1))]
    pub capabilities: Vec<String>,

    /// Lower is preferred on ties
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Per-attempt timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1))]
    pub timeout_ms: u64,

    /// Admitted attempts per fixed 60-second window
    #[serde(default = "default_rate_limit")]
    #[validate(range(min = 1))]
    pub rate_limit_per_minute: u32,

    /// Consecutive failures that open the circuit
    #[serde(default = "default_max_failures")]
    #[validate(range(min = 1))]
    pub max_consecutive_failures: u32,

    /// How long the circuit stays open, in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Shape of a bespoke REST backend (required iff `protocol = rest`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub rest: Option<RestShape>,
}

impl ProviderConfig {
    /// Create a provider with default limits and no capabilities
    pub fn new(
        id: impl Into<String>,
        protocol: ProtocolKind,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            protocol,
            endpoint: endpoint.into(),
            credential_ref: None,
            model: model.into(),
            capabilities: Vec::new(),
            priority: default_priority(),
            timeout_ms: default_timeout_ms(),
            rate_limit_per_minute: default_rate_limit(),
            max_consecutive_failures: default_max_failures(),
            cooldown_ms: default_cooldown_ms(),
            rest: None,
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the credential reference
    #[must_use]
    pub fn with_credential_ref(mut self, credential_ref: impl Into<String>) -> Self {
        self.credential_ref = Some(credential_ref.into());
        self
    }

    /// Add a capability tag
    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        let capability = capability.into();
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    /// Set the priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the rate limit
    #[must_use]
    pub fn with_rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = limit;
        self
    }

    /// Set the circuit threshold and cooldown
    #[must_use]
    pub fn with_circuit(mut self, max_consecutive_failures: u32, cooldown_ms: u64) -> Self {
        self.max_consecutive_failures = max_consecutive_failures;
        self.cooldown_ms = cooldown_ms;
        self
    }

    /// Set the REST shape
    #[must_use]
    pub fn with_rest_shape(mut self, shape: RestShape) -> Self {
        self.rest = Some(shape);
        self
    }

    /// Display name, falling back to the id
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }

    /// Credential reference, `None` when missing or blank
    #[must_use]
    pub fn credential_ref(&self) -> Option<&str> {
        self.credential_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Whether the provider declares exactly this task type
    #[must_use]
    pub fn has_capability(&self, task_type: &str) -> bool {
        self.capabilities.iter().any(|c| c == task_type)
    }

    /// Whether the provider can serve a task type, exactly or via `general`
    #[must_use]
    pub fn serves(&self, task_type: &str) -> bool {
        self.has_capability(task_type) || self.has_capability(GENERAL_CAPABILITY)
    }

    /// Endpoint joined with a path, tolerating a trailing slash
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Validate field constraints and cross-field rules
    ///
    /// # Errors
    /// Returns `RelayError::InvalidProvider` describing the first violation
    pub fn check(&self) -> RelayResult<()> {
        self.validate()
            .map_err(|e| RelayError::invalid_provider(&self.id, e.to_string()))?;

        match (self.protocol, &self.rest) {
            (ProtocolKind::Rest, None) => {
                return Err(RelayError::invalid_provider(
                    &self.id,
                    "protocol 'rest' requires a 'rest' shape",
                ));
            }
            (ProtocolKind::Rest, Some(shape)) => {
                if !shape.response_pointer.starts_with('/') {
                    return Err(RelayError::invalid_provider(
                        &self.id,
                        format!(
                            "response_pointer must be a JSON pointer starting with '/', got '{}'",
                            shape.response_pointer
                        ),
                    ));
                }
            }
            (other, Some(_)) => {
                return Err(RelayError::invalid_provider(
                    &self.id,
                    format!("'rest' shape is only valid with protocol 'rest', not '{other}'"),
                ));
            }
            (_, None) => {}
        }

        if self.capabilities.iter().any(|c| c.trim().is_empty()) {
            return Err(RelayError::invalid_provider(
                &self.id,
                "capability tags cannot be blank",
            ));
        }

        Ok(())
    }
}

/// Read-only view of provider health used for chain ordering
pub trait HealthLookup {
    /// Current health score (0-100) of a provider; unknown providers are healthy
    fn health_score(&self, provider_id: &str) -> u8;
}
