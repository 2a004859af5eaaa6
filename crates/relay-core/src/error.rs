//! Error types for the relay.
//!
//! Two families live here:
//! - [`RelayError`]: configuration and startup failures. These are the only
//!   errors allowed to fail fast, before any orchestration call is possible.
//! - [`ProtocolError`]: a single provider attempt failed. These are always
//!   recovered by the orchestrator and never abort a call.
//!
//! [`ErrorKind`] is the taxonomy reported to callers in results and records.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for relay setup operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Error taxonomy surfaced in attempt records and orchestration results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The registry produced an empty chain for the task type
    NoProviders,
    /// A provider attempt exceeded its timeout
    Timeout,
    /// Non-2xx status or a connection-level failure
    HttpError,
    /// The response body did not have the expected shape
    MalformedResponse,
    /// Every candidate was attempted or skipped and none succeeded
    AllProvidersFailed,
    /// The caller-supplied overall deadline was hit mid-chain
    DeadlineExceeded,
}

impl ErrorKind {
    /// Stable string form, identical to the serialized representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoProviders => "NO_PROVIDERS",
            Self::Timeout => "TIMEOUT",
            Self::HttpError => "HTTP_ERROR",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::AllProvidersFailed => "ALL_PROVIDERS_FAILED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }

    /// Whether this kind describes a single provider attempt rather than a whole call
    #[must_use]
    pub fn is_attempt_level(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::HttpError | Self::MalformedResponse | Self::DeadlineExceeded
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single provider attempt (adapter or transport level)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The attempt did not complete within the provider timeout
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that elapsed, in milliseconds
        timeout_ms: u64,
    },

    /// The provider answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the vendor envelope, or the raw body
        message: String,
    },

    /// The request never produced a response (connect, DNS, TLS, body read)
    #[error("Transport error: {message}")]
    Transport {
        /// Error message from the HTTP client
        message: String,
    },

    /// The response body failed the expected shape
    #[error("Malformed response: {message}")]
    Malformed {
        /// What was missing or wrong
        message: String,
    },
}

impl ProtocolError {
    /// Create an HTTP status error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Project onto the caller-facing taxonomy
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Http { .. } | Self::Transport { .. } => ErrorKind::HttpError,
            Self::Malformed { .. } => ErrorKind::MalformedResponse,
        }
    }

    /// HTTP status code, if the provider answered at all
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Configuration and startup errors
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// A provider record failed validation
    #[error("Invalid provider '{provider}': {message}")]
    InvalidProvider {
        /// Provider id (may be empty when the id itself is invalid)
        provider: String,
        /// What failed
        message: String,
    },

    /// Two provider records share the same id
    #[error("Duplicate provider id: {0}")]
    DuplicateProvider(String),

    /// Unexpected internal failure during setup
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

impl RelayError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid provider error
    pub fn invalid_provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidProvider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
