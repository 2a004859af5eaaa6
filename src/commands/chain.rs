//! Chain command - show the fallback chain for a task type.

use anyhow::Result;
use clap::Args;
use relay_config::{EnvCredentialResolver, RelayConfig};
use relay_router::{Orchestrator, ProviderStatus};
use serde::Serialize;

use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the chain command.
#[derive(Args, Debug)]
pub struct ChainArgs {
    /// Task type to build the chain for
    #[arg(default_value = "general")]
    pub task_type: String,
}

/// Chain output.
#[derive(Debug, Serialize)]
pub struct ChainOutput {
    pub task_type: String,
    pub chain: Vec<ProviderStatus>,
}

/// Execute the chain command.
pub fn execute(args: ChainArgs, config: &RelayConfig, format: OutputFormat) -> Result<()> {
    let orchestrator =
        Orchestrator::from_config(config, &EnvCredentialResolver::new())?.build()?;

    let statuses = orchestrator.provider_status();
    let chain: Vec<ProviderStatus> = orchestrator
        .chain_for(&args.task_type)
        .iter()
        .filter_map(|id| statuses.iter().find(|s| &s.id == id).cloned())
        .collect();

    match format {
        OutputFormat::Json => output::json(&CommandResult::success(ChainOutput {
            task_type: args.task_type,
            chain,
        })),
        OutputFormat::Text => {
            output::section(&format!("Fallback chain for '{}'", args.task_type));
            if chain.is_empty() {
                output::warning("No provider serves this task type");
            }
            for (position, status) in chain.iter().enumerate() {
                output::status(
                    &format!(
                        "{}. {} ({}, {}) priority={} health={} state={}",
                        position + 1,
                        status.id,
                        status.protocol,
                        status.model,
                        status.priority,
                        status.health_score,
                        status.state,
                    ),
                    !status.is_cooling_down(),
                );
            }
            Ok(())
        }
    }
}
