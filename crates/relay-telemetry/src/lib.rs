//! # Relay Telemetry
//!
//! Observability for the LLM relay.
//!
//! This crate provides:
//! - Structured logging and optional OpenTelemetry tracing
//! - The per-call metrics event and its sinks (log, buffer, Prometheus)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod metrics;
pub mod tracing_setup;

// Re-export main types
pub use metrics::{
    BufferedSink, FanoutSink, MetricsEvent, MetricsSink, PrometheusSink, TracingSink,
};
pub use opentelemetry_sdk::trace::TracerProvider;
pub use tracing_setup::{init_tracing, shutdown_tracing, TracingConfig, TracingError};
