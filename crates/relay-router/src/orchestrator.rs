//! Fallback orchestrator.
//!
//! One call moves through `CACHE_CHECK -> CHAIN_SELECT -> ATTEMPT* -> DONE`:
//! - a cache hit returns before the chain is built and touches no provider state
//! - each candidate needs a circuit permit, then a rate-limit admission
//! - attempts are strictly sequential and bounded by the provider timeout
//!   and the caller's deadline, whichever is closer
//! - provider failures only advance the chain
//!
//! Every call returns an [`OrchestrationResult`] and emits exactly one
//! metrics event.

use crate::status::ProviderStatus;
use relay_config::RelayConfig;
use relay_core::{
    AttemptRecord, CredentialResolver, ErrorKind, Fingerprint, GenerationRequest,
    OrchestrationResult, ProtocolError, RelayResult, Transport,
};
use relay_providers::{HttpTransport, ProviderEntry, ProviderRegistry};
use relay_resilience::{HealthTracker, RateLimiter, ResponseCache};
use relay_telemetry::{MetricsEvent, MetricsSink, TracingSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

/// Why a single attempt did not produce text
enum AttemptError {
    Provider(ProtocolError),
    Deadline,
}

/// Multi-provider request orchestrator
///
/// Cheap to share behind an `Arc`; concurrent calls only contend on the
/// per-provider state of the provider they are attempting.
pub struct Orchestrator {
    registry: Arc<ProviderRegistry>,
    transport: Arc<dyn Transport>,
    health: Arc<HealthTracker>,
    limiter: Arc<RateLimiter>,
    cache: Option<Arc<ResponseCache>>,
    metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.registry.len())
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create a builder over a provider registry
    #[must_use]
    pub fn builder(registry: Arc<ProviderRegistry>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(registry)
    }

    /// Build an orchestrator from loaded configuration
    ///
    /// Providers whose credential does not resolve are left out of the
    /// registry. The response cache is in-memory and only present when
    /// enabled.
    ///
    /// # Errors
    /// Returns an error for invalid provider records or if the HTTP client
    /// cannot be created
    pub fn from_config(
        config: &RelayConfig,
        resolver: &dyn CredentialResolver,
    ) -> RelayResult<OrchestratorBuilder> {
        let registry = ProviderRegistry::from_configs(&config.providers, resolver)?;
        let mut builder = Self::builder(Arc::new(registry));
        if config.cache.enabled {
            builder = builder.cache(Arc::new(ResponseCache::in_memory(
                config.cache.max_entries,
                config.cache.default_ttl,
            )));
        }
        Ok(builder)
    }

    /// Produce a response for `request`, falling back along the provider chain
    ///
    /// `deadline` bounds the whole call, measured from now. When it is hit
    /// the remaining chain is abandoned and the attempts so far are returned
    /// with `DEADLINE_EXCEEDED`.
    #[instrument(name = "orchestrate", skip_all, fields(task_type = %request.task_type))]
    pub async fn orchestrate(
        &self,
        request: &GenerationRequest,
        deadline: Option<Duration>,
    ) -> OrchestrationResult {
        let start = Instant::now();
        let deadline_at = deadline.map(|d| start + d);

        let result = self.run(request, start, deadline_at).await;

        self.metrics
            .record(&MetricsEvent::from_result(request.task_type.as_str(), &result));

        info!(
            success = result.success,
            provider_used = result.provider_used.as_deref().unwrap_or("none"),
            attempts = result.attempts.len(),
            error_kind = result.error_kind.map_or("none", |k| k.as_str()),
            duration_ms = result.total_duration_ms,
            "Orchestration finished"
        );

        result
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        start: Instant,
        deadline_at: Option<Instant>,
    ) -> OrchestrationResult {
        let fingerprint = request.cacheable.then(|| request.fingerprint());

        if let Some(text) = self.cached(fingerprint.as_ref()).await {
            return OrchestrationResult::from_cache(text, elapsed_ms(start));
        }

        let chain = self
            .registry
            .build_chain(&request.task_type, self.health.as_ref());
        if chain.is_empty() {
            warn!(task_type = %request.task_type, "No provider serves this task type");
            return OrchestrationResult::failed(ErrorKind::NoProviders, Vec::new(), elapsed_ms(start));
        }

        debug!(
            chain = ?chain.iter().map(|e| e.id()).collect::<Vec<_>>(),
            "Candidate chain built"
        );

        let mut attempts = Vec::with_capacity(chain.len());
        for entry in &chain {
            let provider_id = entry.id();

            if deadline_at.is_some_and(|at| Instant::now() >= at) {
                warn!(provider = %provider_id, "Deadline exceeded before attempt");
                return OrchestrationResult::failed(
                    ErrorKind::DeadlineExceeded,
                    attempts,
                    elapsed_ms(start),
                );
            }

            let Some(permit) = self.health.try_acquire(entry.config()) else {
                debug!(provider = %provider_id, "Circuit open, skipping provider");
                attempts.push(AttemptRecord::skipped_circuit(provider_id));
                continue;
            };

            if !self.limiter.try_acquire(provider_id) {
                // Unsettled: a rate-limit skip is not a provider failure
                drop(permit);
                debug!(provider = %provider_id, "Rate limited, skipping provider");
                attempts.push(AttemptRecord::skipped_rate_limit(provider_id));
                continue;
            }

            let span = info_span!("attempt", provider = %provider_id, trial = permit.is_trial());
            let attempt_start = Instant::now();
            let outcome = self
                .attempt(entry, request, deadline_at)
                .instrument(span)
                .await;
            let duration_ms = elapsed_ms(attempt_start);

            match outcome {
                Ok(text) => {
                    permit.success();
                    attempts.push(AttemptRecord::success(provider_id, duration_ms));
                    if let (Some(cache), Some(fingerprint)) = (&self.cache, &fingerprint) {
                        cache.put_default(fingerprint, &text, provider_id).await;
                    }
                    return OrchestrationResult::succeeded(
                        provider_id,
                        text,
                        attempts,
                        elapsed_ms(start),
                    );
                }
                Err(AttemptError::Provider(err)) => {
                    permit.failure();
                    warn!(
                        provider = %provider_id,
                        error_kind = %err.kind(),
                        status = ?err.status_code(),
                        duration_ms,
                        error = %err,
                        "Provider attempt failed"
                    );
                    attempts.push(AttemptRecord::failure(
                        provider_id,
                        duration_ms,
                        err.kind(),
                        err.to_string(),
                    ));
                }
                Err(AttemptError::Deadline) => {
                    drop(permit);
                    warn!(
                        provider = %provider_id,
                        duration_ms,
                        "Deadline exceeded during attempt"
                    );
                    attempts.push(AttemptRecord::failure(
                        provider_id,
                        duration_ms,
                        ErrorKind::DeadlineExceeded,
                        "caller deadline exceeded",
                    ));
                    return OrchestrationResult::failed(
                        ErrorKind::DeadlineExceeded,
                        attempts,
                        elapsed_ms(start),
                    );
                }
            }
        }

        OrchestrationResult::failed(ErrorKind::AllProvidersFailed, attempts, elapsed_ms(start))
    }

    async fn cached(&self, fingerprint: Option<&Fingerprint>) -> Option<String> {
        let (cache, fingerprint) = (self.cache.as_ref()?, fingerprint?);
        let entry = cache.get(fingerprint).await?;
        debug!(
            fingerprint = %fingerprint.as_str(),
            produced_by = %entry.provider_id,
            "Cache hit"
        );
        Some(entry.response)
    }

    async fn attempt(
        &self,
        entry: &ProviderEntry,
        request: &GenerationRequest,
        deadline_at: Option<Instant>,
    ) -> Result<String, AttemptError> {
        let timeout_ms = entry.config().timeout_ms;
        let timeout = Duration::from_millis(timeout_ms);

        let (limit, deadline_bound) = match deadline_at {
            Some(at) => {
                let remaining = at.saturating_duration_since(Instant::now());
                if remaining < timeout {
                    (remaining, true)
                } else {
                    (timeout, false)
                }
            }
            None => (timeout, false),
        };

        let wire = entry.encode(request);
        let call = async {
            let response = self.transport.send(wire).await?;
            entry.adapter().decode(&response)
        };

        match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(AttemptError::Provider),
            Err(_) if deadline_bound => Err(AttemptError::Deadline),
            Err(_) => Err(AttemptError::Provider(ProtocolError::Timeout { timeout_ms })),
        }
    }

    /// Ordered candidate ids for a task type, as the next call would try them
    #[must_use]
    pub fn chain_for(&self, task_type: &str) -> Vec<String> {
        self.registry
            .build_chain(task_type, self.health.as_ref())
            .iter()
            .map(|e| e.id().to_string())
            .collect()
    }

    /// Status of every registered provider, in registration order
    #[must_use]
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        self.registry
            .providers()
            .iter()
            .map(|entry| {
                let health = self.health.snapshot(entry.id()).unwrap_or_default();
                ProviderStatus::new(entry, health, self.limiter.remaining(entry.id()))
            })
            .collect()
    }

    /// Provider registry
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Circuit breakers of every provider
    #[must_use]
    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    /// Per-provider rate limiter
    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Response cache, if enabled
    #[must_use]
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_deref()
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    registry: Arc<ProviderRegistry>,
    transport: Option<Arc<dyn Transport>>,
    health: Option<Arc<HealthTracker>>,
    limiter: Option<Arc<RateLimiter>>,
    cache: Option<Arc<ResponseCache>>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl OrchestratorBuilder {
    /// Create a builder over a provider registry
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            transport: None,
            health: None,
            limiter: None,
            cache: None,
            metrics: None,
        }
    }

    /// Set the transport (default: [`HttpTransport`])
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Share an existing health tracker
    #[must_use]
    pub fn health_tracker(mut self, health: Arc<HealthTracker>) -> Self {
        self.health = Some(health);
        self
    }

    /// Share an existing rate limiter
    #[must_use]
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Enable the response cache
    #[must_use]
    pub fn cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the metrics sink (default: [`TracingSink`])
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the orchestrator, registering every provider's breaker and
    /// rate window
    ///
    /// # Errors
    /// Returns an error if the default HTTP transport cannot be created
    pub fn build(self) -> RelayResult<Orchestrator> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?),
        };
        let health = self.health.unwrap_or_default();
        let limiter = self.limiter.unwrap_or_default();

        for entry in self.registry.providers() {
            health.register(entry.config());
            limiter.register_provider(entry.config());
        }

        info!(
            providers = self.registry.len(),
            cache = self.cache.is_some(),
            "Orchestrator ready"
        );

        Ok(Orchestrator {
            registry: self.registry,
            transport,
            health,
            limiter,
            cache: self.cache,
            metrics: self.metrics.unwrap_or_else(|| Arc::new(TracingSink)),
        })
    }
}

impl std::fmt::Debug for OrchestratorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorBuilder")
            .field("providers", &self.registry.len())
            .field("transport", &self.transport.is_some())
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}
