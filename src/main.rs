//! # LLM Relay
//!
//! Command-line front end for the multi-provider request orchestrator.
//!
//! ## Usage
//!
//! ```bash
//! # Orchestrate one prompt with the configured providers
//! llm-relay run "Explain the borrow checker in one paragraph"
//!
//! # Show the fallback chain for a task type
//! llm-relay chain code_review
//!
//! # Validate a configuration file
//! llm-relay --config config/relay.toml validate
//! ```
//!
//! The configuration file defaults to `$RELAY_CONFIG`, then
//! `config/relay.yaml`. Provider credentials are read from the environment
//! variables named by each provider's `credential_ref`; a `.env` file is
//! loaded when present.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod output;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    cli.execute().await
}
