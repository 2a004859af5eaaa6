//! Run command - orchestrate one prompt.

use anyhow::{bail, Result};
use clap::Args;
use relay_config::{EnvCredentialResolver, RelayConfig};
use relay_core::{GenerationRequest, OrchestrationResult};
use relay_router::Orchestrator;
use relay_telemetry::{FanoutSink, PrometheusSink, TracingSink};
use std::sync::Arc;
use std::time::Duration;

use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// User prompt
    pub prompt: String,

    /// Task type used to select providers
    #[arg(short, long, default_value = "general")]
    pub task_type: String,

    /// System message
    #[arg(short, long, default_value = "")]
    pub system: String,

    /// Maximum tokens to generate
    #[arg(long, default_value = "1024")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[arg(long, default_value = "0.7")]
    pub temperature: f64,

    /// Bypass the response cache
    #[arg(long)]
    pub no_cache: bool,

    /// Overall deadline for the call, in milliseconds
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    /// Print Prometheus metrics after the call
    #[arg(long)]
    pub metrics: bool,
}

impl RunArgs {
    fn request(&self) -> GenerationRequest {
        GenerationRequest::new(self.task_type.clone(), self.prompt.clone())
            .with_system_message(self.system.clone())
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_cacheable(!self.no_cache)
    }
}

/// Execute the run command.
pub async fn execute(args: RunArgs, config: &RelayConfig, format: OutputFormat) -> Result<()> {
    let prometheus = Arc::new(PrometheusSink::standalone()?);
    let sinks = FanoutSink::new()
        .with_sink(Arc::new(TracingSink))
        .with_sink(prometheus.clone());

    let orchestrator = Orchestrator::from_config(config, &EnvCredentialResolver::new())?
        .metrics(Arc::new(sinks))
        .build()?;

    for excluded in orchestrator.registry().excluded() {
        output::warning(&format!(
            "Provider '{}' excluded: {}",
            excluded.id, excluded.reason
        ));
    }

    let result = orchestrator
        .orchestrate(&args.request(), args.deadline_ms.map(Duration::from_millis))
        .await;

    match format {
        OutputFormat::Json => {
            let outcome = failure_message(&result).map_or_else(
                || CommandResult::success(&result),
                |message| CommandResult::failure_with(&result, message),
            );
            output::json(&outcome)?;
        }
        OutputFormat::Text => print_text(&result),
    }

    if args.metrics {
        output::section("Metrics");
        println!("{}", prometheus.gather_text()?);
    }

    if let Some(message) = failure_message(&result) {
        bail!(message);
    }
    Ok(())
}

fn failure_message(result: &OrchestrationResult) -> Option<String> {
    if result.success {
        return None;
    }
    let kind = result.error_kind.map_or("FAILED", |k| k.as_str());
    Some(match result.last_attempt_error {
        Some(last) => format!("Orchestration failed: {kind} (last attempt: {last})"),
        None => format!("Orchestration failed: {kind}"),
    })
}

fn print_text(result: &OrchestrationResult) {
    if let Some(response) = &result.response {
        println!("{response}");
    }

    output::section("Orchestration");
    output::key_value(
        "Provider",
        result.provider_used.as_deref().unwrap_or("none"),
    );
    output::key_value("Duration", &format!("{}ms", result.total_duration_ms));

    if result.is_cache_hit() {
        output::info("Served from cache");
    } else if !result.attempts.is_empty() {
        output::section("Attempts");
        output::attempts(&result.attempts);
    }

    if result.success {
        output::success("Completed");
    }
}
