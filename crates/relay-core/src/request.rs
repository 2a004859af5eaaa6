//! Generation requests and their cache fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f64 {
    0.7
}

fn default_cacheable() -> bool {
    true
}

/// Caller-supplied generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Task-type tag used to select candidate providers
    pub task_type: String,

    /// System message (may be empty)
    #[serde(default)]
    pub system_message: String,

    /// User prompt
    pub user_prompt: String,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Whether a successful response may be cached
    #[serde(default = "default_cacheable")]
    pub cacheable: bool,
}

impl GenerationRequest {
    /// Create a request with default sampling parameters
    pub fn new(task_type: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            system_message: String::new(),
            user_prompt: user_prompt.into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            cacheable: default_cacheable(),
        }
    }

    /// Set the system message
    #[must_use]
    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = system_message.into();
        self
    }

    /// Set the max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set whether the response may be cached
    #[must_use]
    pub fn with_cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Compute the cache fingerprint of this request
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }
}

/// Deterministic hash of the five cache-relevant request fields
///
/// Covers `task_type`, `system_message`, `user_prompt`, `max_tokens` and
/// `temperature`, byte for byte. No normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a request
    #[must_use]
    pub fn of(request: &GenerationRequest) -> Self {
        let mut hasher = Sha256::new();
        for field in [
            &request.task_type,
            &request.system_message,
            &request.user_prompt,
        ] {
            // Length prefix keeps ("ab", "c") distinct from ("a", "bc")
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        hasher.update(request.max_tokens.to_be_bytes());
        hasher.update(request.temperature.to_bits().to_be_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Hex string form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
