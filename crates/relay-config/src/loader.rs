//! Configuration file loading.
//!
//! The format follows the file extension. After parsing, `RELAY_*`
//! environment overrides are applied and the result is validated.

use crate::config::RelayConfig;
use relay_core::{RelayError, RelayResult};
use std::path::Path;
use tracing::{debug, info};

/// Path used when `RELAY_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/relay.yaml";

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "RELAY_CONFIG";

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML (`.yaml`, `.yml`)
    Yaml,
    /// TOML (`.toml`)
    Toml,
    /// JSON (`.json`)
    Json,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Format name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }

    /// Parse a configuration document
    ///
    /// No overrides are applied and nothing is validated.
    ///
    /// # Errors
    /// Returns a configuration error when the document does not parse
    pub fn parse(self, content: &str) -> RelayResult<RelayConfig> {
        let parsed = match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| {
            RelayError::configuration(format!("invalid {} config: {e}", self.as_str()))
        })
    }

    /// Render a configuration in this format
    ///
    /// # Errors
    /// Returns a configuration error when serialization fails
    pub fn render(self, config: &RelayConfig) -> RelayResult<String> {
        let rendered = match self {
            Self::Yaml => serde_yaml::to_string(config).map_err(|e| e.to_string()),
            Self::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
        };
        rendered.map_err(RelayError::configuration)
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load, override and validate a configuration file
///
/// # Errors
/// Returns a configuration error when the file cannot be read, has an unknown
/// extension, does not parse, or fails validation
pub async fn load_from_path(path: impl AsRef<Path>) -> RelayResult<RelayConfig> {
    load_with_overrides(path.as_ref(), |key| std::env::var(key).ok()).await
}

/// Load the file named by `RELAY_CONFIG`, or [`DEFAULT_CONFIG_PATH`]
///
/// # Errors
/// See [`load_from_path`]
pub async fn load_config() -> RelayResult<RelayConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_from_path(path).await
}

/// Load a file with overrides read through `lookup`
///
/// # Errors
/// See [`load_from_path`]
pub async fn load_with_overrides<F>(path: &Path, lookup: F) -> RelayResult<RelayConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let format = ConfigFormat::from_path(path).ok_or_else(|| {
        RelayError::configuration(format!(
            "unsupported config file extension: {}",
            path.display()
        ))
    })?;

    debug!(path = %path.display(), format = %format, "Reading configuration");
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        RelayError::configuration(format!("failed to read {}: {e}", path.display()))
    })?;

    let mut config = format.parse(&content)?;
    config.apply_overrides(lookup)?;
    config.validate()?;

    info!(
        path = %path.display(),
        providers = config.providers.len(),
        cache_enabled = config.cache.enabled,
        "Configuration loaded"
    );
    Ok(config)
}
