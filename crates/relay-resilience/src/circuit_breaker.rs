//! Circuit breaker and health tracking.
//!
//! Each provider owns one [`CircuitBreaker`]: a CLOSED / OPEN / HALF_OPEN
//! state machine plus a 0-100 health score. The [`HealthTracker`] is the only
//! writer of provider health; callers obtain an [`AttemptPermit`] before
//! invoking a provider and settle it with the outcome.
//!
//! OPEN moves to HALF_OPEN lazily, when the provider is next considered after
//! its cooldown. HALF_OPEN admits exactly one trial at a time.

use dashmap::DashMap;
use parking_lot::Mutex;
use relay_core::{HealthLookup, ProviderConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Maximum (and initial) health score
pub const MAX_HEALTH: u8 = 100;

const SUCCESS_BONUS: u8 = 5;
const FAILURE_PENALTY: u8 = 10;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Attempts flow normally
    Closed,
    /// Attempts are rejected until the cooldown elapses
    Open,
    /// A single trial attempt decides whether to close again
    HalfOpen,
}

impl CircuitState {
    /// Get the state name as a string
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub max_consecutive_failures: u32,
    /// How long the circuit stays open before a trial is allowed
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 3,
            cooldown: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerConfig {
    /// Take the thresholds from a provider record
    #[must_use]
    pub fn from_provider(provider: &ProviderConfig) -> Self {
        Self {
            max_consecutive_failures: provider.max_consecutive_failures.max(1),
            cooldown: Duration::from_millis(provider.cooldown_ms),
        }
    }
}

/// Point-in-time copy of one provider's health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderHealth {
    /// Circuit state
    pub state: CircuitState,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Health score in `[0, 100]`
    pub health_score: u8,
    /// When the circuit last opened
    pub opened_at: Option<Instant>,
    /// When an attempt outcome was last recorded
    pub last_used_at: Option<Instant>,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            health_score: MAX_HEALTH,
            opened_at: None,
            last_used_at: None,
        }
    }
}

impl ProviderHealth {
    /// Time left before an open circuit admits a trial
    #[must_use]
    pub fn cooldown_remaining(&self, cooldown: Duration) -> Option<Duration> {
        match (self.state, self.opened_at) {
            (CircuitState::Open, Some(opened_at)) => {
                Some((opened_at + cooldown).saturating_duration_since(Instant::now()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    health: ProviderHealth,
    trial_in_flight: bool,
}

/// Circuit breaker for a single provider
#[derive(Debug)]
pub struct CircuitBreaker {
    provider_id: String,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(provider_id: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            provider_id: provider_id.into(),
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(provider_id: impl Into<String>) -> Self {
        Self::new(provider_id, CircuitBreakerConfig::default())
    }

    /// Get the provider ID
    #[must_use]
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> CircuitBreakerConfig {
        self.config
    }

    /// Get the current state (no lazy transition is applied)
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.state.lock().health.state
    }

    /// Get the current health score
    #[must_use]
    pub fn health_score(&self) -> u8 {
        self.state.lock().health.health_score
    }

    /// Copy of the current health
    #[must_use]
    pub fn snapshot(&self) -> ProviderHealth {
        self.state.lock().health
    }

    /// Ask to attempt this provider
    ///
    /// Returns `None` while the circuit is open and cooling down, or while
    /// another caller holds the half-open trial.
    pub fn try_acquire(self: &Arc<Self>) -> Option<AttemptPermit> {
        let now = Instant::now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let trial = match state.health.state {
            CircuitState::Closed => false,
            CircuitState::Open => {
                let cooled_down = state
                    .health
                    .opened_at
                    .map_or(true, |opened_at| now >= opened_at + self.config.cooldown);
                if !cooled_down {
                    return None;
                }
                state.health.state = CircuitState::HalfOpen;
                state.trial_in_flight = true;
                info!(provider = %self.provider_id, "Circuit breaker half-open, testing");
                true
            }
            CircuitState::HalfOpen => {
                if state.trial_in_flight {
                    debug!(provider = %self.provider_id, "Half-open trial already in flight");
                    return None;
                }
                state.trial_in_flight = true;
                true
            }
        };

        Some(AttemptPermit {
            breaker: Arc::clone(self),
            trial,
            settled: false,
        })
    }

    fn on_success(&self, trial: bool) {
        let mut state = self.state.lock();
        let health = &mut state.health;
        health.consecutive_failures = 0;
        health.health_score = health.health_score.saturating_add(SUCCESS_BONUS).min(MAX_HEALTH);
        health.last_used_at = Some(Instant::now());

        if trial {
            state.trial_in_flight = false;
            if state.health.state == CircuitState::HalfOpen {
                state.health.state = CircuitState::Closed;
                state.health.opened_at = None;
                info!(provider = %self.provider_id, "Circuit breaker closed");
            }
        }
    }

    fn on_failure(&self, trial: bool) {
        let now = Instant::now();
        let mut state = self.state.lock();
        let health = &mut state.health;
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);
        health.health_score = health.health_score.saturating_sub(FAILURE_PENALTY);
        health.last_used_at = Some(now);

        let reopen = if trial {
            state.trial_in_flight = false;
            state.health.state == CircuitState::HalfOpen
        } else {
            state.health.state == CircuitState::Closed
                && state.health.consecutive_failures >= self.config.max_consecutive_failures
        };

        if reopen {
            state.health.state = CircuitState::Open;
            state.health.opened_at = Some(now);
            warn!(
                provider = %self.provider_id,
                consecutive_failures = state.health.consecutive_failures,
                health_score = state.health.health_score,
                cooldown_ms = self.config.cooldown.as_millis() as u64,
                "Circuit breaker opened"
            );
        } else {
            debug!(
                provider = %self.provider_id,
                consecutive_failures = state.health.consecutive_failures,
                health_score = state.health.health_score,
                "Provider failure recorded"
            );
        }
    }

    fn on_abandon(&self, trial: bool) {
        if !trial {
            return;
        }
        let mut state = self.state.lock();
        state.trial_in_flight = false;
        if state.health.state == CircuitState::HalfOpen {
            // opened_at is kept, so the next caller may trial straight away
            state.health.state = CircuitState::Open;
            debug!(provider = %self.provider_id, "Half-open trial abandoned");
        }
    }

    /// Reset to a closed, fully healthy state
    pub fn reset(&self) {
        *self.state.lock() = BreakerState::default();
        info!(provider = %self.provider_id, "Circuit breaker reset");
    }

    /// Force the circuit open, restarting the cooldown
    pub fn force_open(&self) {
        let mut state = self.state.lock();
        state.health.state = CircuitState::Open;
        state.health.opened_at = Some(Instant::now());
        state.trial_in_flight = false;
        warn!(provider = %self.provider_id, "Circuit breaker forced open");
    }
}

/// Admission to attempt one provider, settled with the attempt's outcome
///
/// Dropping a permit without settling it (cancellation, caller deadline)
/// leaves counters and score untouched; a half-open trial goes back to OPEN.
#[must_use = "an attempt permit must be settled with success() or failure()"]
#[derive(Debug)]
pub struct AttemptPermit {
    breaker: Arc<CircuitBreaker>,
    trial: bool,
    settled: bool,
}

impl AttemptPermit {
    /// Whether this permit is the half-open trial
    #[must_use]
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Provider this permit admits
    #[must_use]
    pub fn provider_id(&self) -> &str {
        self.breaker.provider_id()
    }

    /// Record a successful attempt
    pub fn success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.trial);
    }

    /// Record a failed attempt
    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.trial);
    }
}

impl Drop for AttemptPermit {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.on_abandon(self.trial);
        }
    }
}

/// Registry of per-provider circuit breakers
#[derive(Debug, Default)]
pub struct HealthTracker {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl HealthTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, keeping any existing state
    pub fn register(&self, provider: &ProviderConfig) -> Arc<CircuitBreaker> {
        self.breaker_for(provider)
    }

    /// Breaker for a provider, created from its thresholds on first use
    pub fn breaker_for(&self, provider: &ProviderConfig) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(&provider.id) {
            return Arc::clone(existing.value());
        }
        let breaker = self
            .breakers
            .entry(provider.id.clone())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    provider.id.clone(),
                    CircuitBreakerConfig::from_provider(provider),
                ))
            });
        Arc::clone(breaker.value())
    }

    /// Breaker for a registered provider id
    #[must_use]
    pub fn get(&self, provider_id: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(provider_id).map(|b| Arc::clone(b.value()))
    }

    /// Ask to attempt a provider
    pub fn try_acquire(&self, provider: &ProviderConfig) -> Option<AttemptPermit> {
        self.breaker_for(provider).try_acquire()
    }

    /// Health of one provider
    #[must_use]
    pub fn snapshot(&self, provider_id: &str) -> Option<ProviderHealth> {
        self.get(provider_id).map(|b| b.snapshot())
    }

    /// Health of every tracked provider, sorted by id
    #[must_use]
    pub fn snapshots(&self) -> Vec<(String, ProviderHealth)> {
        let mut all: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Force a provider's circuit open; returns false for unknown ids
    pub fn force_open(&self, provider_id: &str) -> bool {
        match self.get(provider_id) {
            Some(breaker) => {
                breaker.force_open();
                true
            }
            None => false,
        }
    }

    /// Reset a provider's circuit; returns false for unknown ids
    pub fn reset(&self, provider_id: &str) -> bool {
        match self.get(provider_id) {
            Some(breaker) => {
                breaker.reset();
                true
            }
            None => false,
        }
    }
}

impl HealthLookup for HealthTracker {
    fn health_score(&self, provider_id: &str) -> u8 {
        self.get(provider_id).map_or(MAX_HEALTH, |b| b.health_score())
    }
}
