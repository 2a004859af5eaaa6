//! Attempt records and orchestration results.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel `provider_used` value for responses served from the cache
pub const CACHE_PROVIDER: &str = "cache";

/// Outcome of considering one provider during an orchestration call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptOutcome {
    /// The provider produced a response
    Success,
    /// The provider was invoked and failed
    Failure,
    /// Skipped because the circuit is open (or its trial is in flight)
    SkippedCircuit,
    /// Skipped because the provider's rate window is exhausted
    SkippedRateLimit,
}

impl AttemptOutcome {
    /// Whether the provider's adapter was actually invoked
    #[must_use]
    pub fn was_invoked(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::SkippedCircuit => "SKIPPED_CIRCUIT",
            Self::SkippedRateLimit => "SKIPPED_RATE_LIMIT",
        };
        f.write_str(s)
    }
}

/// One provider considered in one orchestration call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Provider id
    pub provider_id: String,
    /// What happened
    pub outcome: AttemptOutcome,
    /// Time spent on this provider
    pub duration_ms: u64,
    /// Present iff `outcome = FAILURE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Diagnostic message accompanying a failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AttemptRecord {
    /// Record a successful attempt
    pub fn success(provider_id: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            provider_id: provider_id.into(),
            outcome: AttemptOutcome::Success,
            duration_ms,
            error_kind: None,
            error_message: None,
        }
    }

    /// Record a failed attempt
    pub fn failure(
        provider_id: impl Into<String>,
        duration_ms: u64,
        error_kind: ErrorKind,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            outcome: AttemptOutcome::Failure,
            duration_ms,
            error_kind: Some(error_kind),
            error_message: Some(error_message.into()),
        }
    }

    /// Record a provider skipped by its circuit breaker
    pub fn skipped_circuit(provider_id: impl Into<String>) -> Self {
        Self::skipped(provider_id, AttemptOutcome::SkippedCircuit)
    }

    /// Record a provider skipped by its rate limiter
    pub fn skipped_rate_limit(provider_id: impl Into<String>) -> Self {
        Self::skipped(provider_id, AttemptOutcome::SkippedRateLimit)
    }

    fn skipped(provider_id: impl Into<String>, outcome: AttemptOutcome) -> Self {
        Self {
            provider_id: provider_id.into(),
            outcome,
            duration_ms: 0,
            error_kind: None,
            error_message: None,
        }
    }
}

/// Result of one orchestration call, returned for every outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// Whether a response was produced
    pub success: bool,
    /// Provider id that produced the response, or [`CACHE_PROVIDER`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_used: Option<String>,
    /// Generated text, present iff `success`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Providers considered, in chain order
    pub attempts: Vec<AttemptRecord>,
    /// Wall time of the whole call
    pub total_duration_ms: u64,
    /// Why the call failed (`NO_PROVIDERS`, `ALL_PROVIDERS_FAILED`, `DEADLINE_EXCEEDED`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Error kind of the last failed attempt, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_error: Option<ErrorKind>,
}

impl OrchestrationResult {
    /// Result served from the response cache
    pub fn from_cache(response: impl Into<String>, total_duration_ms: u64) -> Self {
        Self {
            success: true,
            provider_used: Some(CACHE_PROVIDER.to_string()),
            response: Some(response.into()),
            attempts: Vec::new(),
            total_duration_ms,
            error_kind: None,
            last_attempt_error: None,
        }
    }

    /// Result produced by a provider
    pub fn succeeded(
        provider_id: impl Into<String>,
        response: impl Into<String>,
        attempts: Vec<AttemptRecord>,
        total_duration_ms: u64,
    ) -> Self {
        let last_attempt_error = last_failure_kind(&attempts);
        Self {
            success: true,
            provider_used: Some(provider_id.into()),
            response: Some(response.into()),
            attempts,
            total_duration_ms,
            error_kind: None,
            last_attempt_error,
        }
    }

    /// Failed result carrying every attempt made so far
    pub fn failed(
        error_kind: ErrorKind,
        attempts: Vec<AttemptRecord>,
        total_duration_ms: u64,
    ) -> Self {
        let last_attempt_error = last_failure_kind(&attempts);
        Self {
            success: false,
            provider_used: None,
            response: None,
            attempts,
            total_duration_ms,
            error_kind: Some(error_kind),
            last_attempt_error,
        }
    }

    /// Whether the response came from the cache
    #[must_use]
    pub fn is_cache_hit(&self) -> bool {
        self.provider_used.as_deref() == Some(CACHE_PROVIDER)
    }

    /// Outcomes in attempt order
    #[must_use]
    pub fn outcomes(&self) -> Vec<(&str, AttemptOutcome)> {
        self.attempts
            .iter()
            .map(|a| (a.provider_id.as_str(), a.outcome))
            .collect()
    }
}

fn last_failure_kind(attempts: &[AttemptRecord]) -> Option<ErrorKind> {
    attempts.iter().rev().find_map(|a| a.error_kind)
}
