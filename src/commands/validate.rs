//! Validate command - validate the configuration and credentials.

use anyhow::{bail, Result};
use clap::Args;
use relay_config::{EnvCredentialResolver, RelayConfig};
use relay_core::CredentialResolver;
use relay_providers::{ExcludedProvider, ProviderRegistry};
use serde::Serialize;
use std::path::Path;

use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Treat providers excluded for missing credentials as errors
    #[arg(long)]
    pub strict: bool,
}

/// Validation report.
#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub providers: Vec<String>,
    pub excluded: Vec<ExcludedProvider>,
    pub errors: Vec<String>,
}

/// Execute the validate command.
pub async fn execute(args: ValidateArgs, path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let report = match crate::cli::load(path).await {
        Ok(config) => check(&config, &EnvCredentialResolver::new(), args.strict),
        Err(e) => ValidationReport {
            errors: vec![format!("{e:#}")],
            ..Default::default()
        },
    };

    match format {
        OutputFormat::Json => {
            let valid = report.valid;
            let result = if valid {
                CommandResult::success(report)
            } else {
                CommandResult::failure_with(report, "Validation failed")
            };
            output::json(&result)?;
            if !valid {
                bail!("Validation failed");
            }
        }
        OutputFormat::Text => print_text(&report)?,
    }
    Ok(())
}

/// Build the registry as a run would, collecting what is usable.
fn check(config: &RelayConfig, resolver: &dyn CredentialResolver, strict: bool) -> ValidationReport {
    let registry = match ProviderRegistry::from_configs(&config.providers, resolver) {
        Ok(registry) => registry,
        Err(e) => {
            return ValidationReport {
                errors: vec![e.to_string()],
                ..Default::default()
            }
        }
    };

    let mut report = ValidationReport {
        valid: true,
        providers: registry.providers().iter().map(|e| e.id().to_string()).collect(),
        excluded: registry.excluded().to_vec(),
        errors: Vec::new(),
    };

    if report.providers.is_empty() {
        report.errors.push("No usable provider configured".to_string());
    }
    if strict {
        report.errors.extend(
            report
                .excluded
                .iter()
                .map(|p| format!("Provider '{}' excluded: {}", p.id, p.reason)),
        );
    }
    report.valid = report.errors.is_empty();
    report
}

fn print_text(report: &ValidationReport) -> Result<()> {
    if !report.providers.is_empty() {
        output::section("Providers");
        for id in &report.providers {
            output::status(id, true);
        }
    }
    for excluded in &report.excluded {
        output::warning(&format!("Provider '{}' excluded: {}", excluded.id, excluded.reason));
    }
    for error in &report.errors {
        output::error(error);
    }

    if report.valid {
        output::success("Configuration is valid");
        Ok(())
    } else {
        bail!("Configuration is invalid")
    }
}
