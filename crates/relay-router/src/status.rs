//! Per-provider operational status.

use relay_core::ProtocolKind;
use relay_providers::ProviderEntry;
use relay_resilience::{CircuitBreakerConfig, CircuitState, ProviderHealth};
use serde::Serialize;

/// Configuration summary, health and remaining rate budget of one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    /// Provider id
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Protocol family
    pub protocol: ProtocolKind,
    /// Model identifier
    pub model: String,
    /// Configured priority
    pub priority: i32,
    /// Declared task types
    pub capabilities: Vec<String>,
    /// Circuit state
    pub state: CircuitState,
    /// Health score, 0 to 100
    pub health_score: u8,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Time left before an open circuit may be trialled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_remaining_ms: Option<u64>,
    /// Configured admissions per minute
    pub rate_limit_per_minute: u32,
    /// Admissions left in the current window
    pub rate_remaining: Option<u32>,
}

impl ProviderStatus {
    pub(crate) fn new(
        entry: &ProviderEntry,
        health: ProviderHealth,
        rate_remaining: Option<u32>,
    ) -> Self {
        let config = entry.config();
        let cooldown = CircuitBreakerConfig::from_provider(config).cooldown;
        Self {
            id: config.id.clone(),
            display_name: config.display_name().to_string(),
            protocol: config.protocol,
            model: config.model.clone(),
            priority: config.priority,
            capabilities: config.capabilities.clone(),
            state: health.state,
            health_score: health.health_score,
            consecutive_failures: health.consecutive_failures,
            cooldown_remaining_ms: health
                .cooldown_remaining(cooldown)
                .map(|d| d.as_millis() as u64),
            rate_limit_per_minute: config.rate_limit_per_minute,
            rate_remaining,
        }
    }

    /// Whether an open circuit still refuses attempts
    #[must_use]
    pub fn is_cooling_down(&self) -> bool {
        self.state == CircuitState::Open && self.cooldown_remaining_ms.is_some_and(|ms| ms > 0)
    }
}
