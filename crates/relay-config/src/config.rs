//! Configuration types.

use relay_core::{ProviderConfig, RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use validator::Validate;

/// Top-level relay configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Provider records, in registration order
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging and tracing settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl RelayConfig {
    /// Validate every section
    ///
    /// # Errors
    /// Returns the first invalid provider, a duplicate id, or an invalid section
    pub fn validate(&self) -> RelayResult<()> {
        let mut seen = HashSet::new();
        for provider in &self.providers {
            provider.check()?;
            if !seen.insert(provider.id.as_str()) {
                return Err(RelayError::DuplicateProvider(provider.id.clone()));
            }
        }

        Validate::validate(&self.cache)
            .map_err(|e| RelayError::configuration(format!("cache: {e}")))?;
        Validate::validate(&self.telemetry)
            .map_err(|e| RelayError::configuration(format!("telemetry: {e}")))?;

        debug!(providers = self.providers.len(), "Configuration validated");
        Ok(())
    }

    /// Apply `RELAY_*` overrides read through `lookup`
    ///
    /// # Errors
    /// Returns an error when an override value cannot be parsed
    pub fn apply_overrides<F>(&mut self, lookup: F) -> RelayResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("RELAY_LOG_LEVEL") {
            self.telemetry.log_level = level;
        }
        if let Some(json) = lookup("RELAY_LOG_JSON") {
            self.telemetry.json = parse_bool("RELAY_LOG_JSON", &json)?;
        }
        if let Some(enabled) = lookup("RELAY_CACHE_ENABLED") {
            self.cache.enabled = parse_bool("RELAY_CACHE_ENABLED", &enabled)?;
        }
        if let Some(ttl) = lookup("RELAY_CACHE_TTL") {
            self.cache.default_ttl = humantime_serde::re::humantime::parse_duration(&ttl)
                .map_err(|e| RelayError::configuration(format!("RELAY_CACHE_TTL: {e}")))?;
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    ///
    /// # Errors
    /// Returns an error when an override value cannot be parsed
    pub fn apply_env_overrides(&mut self) -> RelayResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Look up a provider record by id
    #[must_use]
    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }
}

fn parse_bool(key: &str, value: &str) -> RelayResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RelayError::configuration(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(3600)
}

fn default_max_entries() -> usize {
    1000
}

/// Response cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CacheConfig {
    /// Whether responses are cached at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lifetime of a cached response
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub default_ttl: Duration,

    /// Maximum number of cached responses
    #[serde(default = "default_max_entries")]
    #[validate(range(min = 1))]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: default_cache_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "llm-relay".to_string()
}

/// Logging and tracing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TelemetryConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json: bool,

    /// Service name reported in logs and traces
    #[serde(default = "default_service_name")]
    #[validate(length(min = 1))]
    pub service_name: String,

    /// Install the OpenTelemetry tracing layer
    #[serde(default)]
    pub otel_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            service_name: default_service_name(),
            otel_enabled: false,
        }
    }
}
