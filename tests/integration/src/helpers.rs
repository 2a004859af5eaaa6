//! Test helper utilities for integration tests

use crate::fixtures::credentials;
use relay_config::RelayConfig;
use relay_core::{AttemptOutcome, GenerationRequest, OrchestrationResult, ProviderConfig};
use relay_router::Orchestrator;
use relay_telemetry::BufferedSink;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Test tracing, installed on first use when `TEST_LOG` is set
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for tests (safe to call from every test)
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Orchestrator wired to the real HTTP transport, plus its metrics buffer
pub struct TestRelay {
    pub orchestrator: Orchestrator,
    pub metrics: Arc<BufferedSink>,
}

impl TestRelay {
    /// Relay over `providers` with the default in-memory cache
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self::from_config(RelayConfig {
            providers,
            ..Default::default()
        })
    }

    /// Relay over `providers` with caching turned off
    pub fn uncached(providers: Vec<ProviderConfig>) -> Self {
        let mut config = RelayConfig {
            providers,
            ..Default::default()
        };
        config.cache.enabled = false;
        Self::from_config(config)
    }

    /// Relay built from a loaded configuration using the fixture credentials
    pub fn from_config(config: RelayConfig) -> Self {
        init_tracing();
        let metrics = Arc::new(BufferedSink::new(64));
        let orchestrator = Orchestrator::from_config(&config, &credentials())
            .expect("valid configuration")
            .metrics(metrics.clone())
            .build()
            .expect("orchestrator builds");
        Self {
            orchestrator,
            metrics,
        }
    }

    /// Orchestrate without a deadline
    pub async fn run(&self, request: &GenerationRequest) -> OrchestrationResult {
        self.orchestrator.orchestrate(request, None).await
    }
}

/// A `general` request for `prompt`
pub fn request(prompt: &str) -> GenerationRequest {
    GenerationRequest::new("general", prompt)
}

/// Assert the attempt trail matches `expected`, in order
pub fn assert_outcomes(result: &OrchestrationResult, expected: &[(&str, AttemptOutcome)]) {
    let actual = result.outcomes();
    assert_eq!(
        actual,
        expected.to_vec(),
        "unexpected attempt trail: {:#?}",
        result.attempts
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        assert!(Lazy::get(&TRACING).is_some());
    }
}
