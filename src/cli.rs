//! CLI argument definitions using clap.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relay_config::{RelayConfig, TelemetryConfig};
use relay_telemetry::{init_tracing, shutdown_tracing, TracerProvider, TracingConfig};
use std::path::PathBuf;

use crate::commands;
use crate::output::OutputFormat;

/// LLM Relay - fallback orchestration across LLM providers
#[derive(Parser, Debug)]
#[command(name = "llm-relay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (YAML, TOML or JSON); defaults to $RELAY_CONFIG
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Orchestrate one prompt and print the result
    Run(commands::run::RunArgs),

    /// Print the fallback chain for a task type
    Chain(commands::chain::ChainArgs),

    /// Load and validate the configuration
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let format = OutputFormat::from_json_flag(self.json);

        match self.command {
            Commands::Validate(args) => {
                commands::validate::execute(args, self.config.as_deref(), format).await
            }
            Commands::Run(args) => {
                let config = load(self.config.as_deref()).await?;
                let tracer = init_logging(&config.telemetry, self.verbose)?;
                let result = commands::run::execute(args, &config, format).await;
                shutdown_tracing(tracer);
                result
            }
            Commands::Chain(args) => {
                let config = load(self.config.as_deref()).await?;
                let tracer = init_logging(&config.telemetry, self.verbose)?;
                let result = commands::chain::execute(args, &config, format);
                shutdown_tracing(tracer);
                result
            }
        }
    }
}

/// Load configuration from the given path, or `$RELAY_CONFIG` and the default path.
pub async fn load(path: Option<&std::path::Path>) -> Result<RelayConfig> {
    let config = match path {
        Some(path) => relay_config::load_from_path(path).await,
        None => relay_config::load_config().await,
    };
    config.context("Failed to load configuration")
}

/// Install logging from the telemetry section, raised by `-v` flags.
fn init_logging(
    telemetry: &TelemetryConfig,
    verbose: u8,
) -> Result<Option<TracerProvider>> {
    let level = match verbose {
        0 => telemetry.log_level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let config = TracingConfig::new(telemetry.service_name.clone())
        .with_log_level(level)
        .with_json(telemetry.json)
        .with_otel(telemetry.otel_enabled);

    init_tracing(&config).context("Failed to initialize logging")
}
