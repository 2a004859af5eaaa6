//! # Relay Config
//!
//! Configuration management for the LLM relay.
//!
//! - YAML, TOML or JSON files, chosen by extension
//! - `RELAY_*` environment overrides
//! - Fail-fast validation of every provider record
//! - Credential resolution from the environment or a static table

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod loader;

// Re-export main types
pub use config::{CacheConfig, RelayConfig, TelemetryConfig};
pub use credentials::{EnvCredentialResolver, StaticCredentialResolver};
pub use loader::{
    load_config, load_from_path, load_with_overrides, ConfigFormat, CONFIG_PATH_ENV,
    DEFAULT_CONFIG_PATH,
};
