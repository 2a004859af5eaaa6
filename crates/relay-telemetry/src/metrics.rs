//! Orchestration metrics events and sinks.
//!
//! Exactly one [`MetricsEvent`] is emitted per orchestration call, whatever
//! its outcome. Sinks are append-only and must not block the caller.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use relay_core::{ErrorKind, OrchestrationResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::info;

/// Summary of one orchestration call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsEvent {
    /// When the call finished
    pub timestamp: DateTime<Utc>,
    /// Task type of the request
    pub task_type: String,
    /// Provider that answered, `"cache"` for cache hits
    pub provider_used: Option<String>,
    /// Whether a response was produced
    pub success: bool,
    /// Wall time of the call
    pub duration_ms: u64,
    /// Attempt records produced, skipped providers included
    pub attempts_count: usize,
    /// Failure kind of an unsuccessful call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl MetricsEvent {
    /// Summarize a finished call
    pub fn from_result(task_type: impl Into<String>, result: &OrchestrationResult) -> Self {
        Self {
            timestamp: Utc::now(),
            task_type: task_type.into(),
            provider_used: result.provider_used.clone(),
            success: result.success,
            duration_ms: result.total_duration_ms,
            attempts_count: result.attempts.len(),
            error_kind: result.error_kind,
        }
    }

    /// Outcome label: `success` or the lowercase failure kind
    #[must_use]
    pub fn outcome(&self) -> String {
        match (self.success, self.error_kind) {
            (true, _) => "success".to_string(),
            (false, Some(kind)) => kind.as_str().to_ascii_lowercase(),
            (false, None) => "failure".to_string(),
        }
    }
}

/// Consumer of metrics events
pub trait MetricsSink: Send + Sync {
    /// Append one event
    fn record(&self, event: &MetricsEvent);
}

/// Logs every event on the `relay::metrics` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record(&self, event: &MetricsEvent) {
        info!(
            target: "relay::metrics",
            task_type = %event.task_type,
            provider_used = event.provider_used.as_deref().unwrap_or("none"),
            success = event.success,
            duration_ms = event.duration_ms,
            attempts_count = event.attempts_count,
            outcome = %event.outcome(),
            "orchestration"
        );
    }
}

/// Bounded in-memory buffer of recent events
#[derive(Debug)]
pub struct BufferedSink {
    capacity: usize,
    events: Mutex<VecDeque<MetricsEvent>>,
}

impl BufferedSink {
    /// Create a buffer keeping the latest `capacity` events
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Most recent events, newest first
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<MetricsEvent> {
        self.events.lock().iter().rev().take(limit).cloned().collect()
    }

    /// All buffered events, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<MetricsEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Number of buffered events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether the buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drop every buffered event
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for BufferedSink {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl MetricsSink for BufferedSink {
    fn record(&self, event: &MetricsEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

/// Prometheus counters and histograms fed by metrics events
#[derive(Clone)]
pub struct PrometheusSink {
    registry: Registry,
    orchestrations: IntCounterVec,
    duration: Histogram,
    attempts: Histogram,
}

impl PrometheusSink {
    /// Register the relay metrics in `registry`
    ///
    /// # Errors
    /// Returns an error if a metric with the same name is already registered
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let orchestrations = IntCounterVec::new(
            Opts::new(
                "relay_orchestrations_total",
                "Orchestration calls by task type, provider and outcome",
            ),
            &["task_type", "provider", "outcome"],
        )?;
        let duration = Histogram::with_opts(
            HistogramOpts::new(
                "relay_orchestration_duration_seconds",
                "Wall time of orchestration calls",
            )
            .buckets(vec![0.005, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;
        let attempts = Histogram::with_opts(
            HistogramOpts::new(
                "relay_orchestration_attempts",
                "Attempt records per orchestration call",
            )
            .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0]),
        )?;

        registry.register(Box::new(orchestrations.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(attempts.clone()))?;

        Ok(Self {
            registry: registry.clone(),
            orchestrations,
            duration,
            attempts,
        })
    }

    /// Register the relay metrics in a private registry
    ///
    /// # Errors
    /// Returns an error if the metrics cannot be created
    pub fn standalone() -> prometheus::Result<Self> {
        Self::new(&Registry::new())
    }

    /// Registry holding the relay metrics
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition of every metric in the registry
    ///
    /// # Errors
    /// Returns an error if encoding fails
    pub fn gather_text(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

impl std::fmt::Debug for PrometheusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusSink").finish_non_exhaustive()
    }
}

impl MetricsSink for PrometheusSink {
    fn record(&self, event: &MetricsEvent) {
        let provider = event.provider_used.as_deref().unwrap_or("none");
        let outcome = event.outcome();
        self.orchestrations
            .with_label_values(&[event.task_type.as_str(), provider, outcome.as_str()])
            .inc();
        self.duration.observe(event.duration_ms as f64 / 1000.0);
        self.attempts.observe(event.attempts_count as f64);
    }
}

/// Forwards every event to several sinks
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn MetricsSink>>,
}

impl FanoutSink {
    /// Create an empty fanout
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of sinks
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sink is attached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl MetricsSink for FanoutSink {
    fn record(&self, event: &MetricsEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
