//! Integration tests for the LLM relay
//!
//! These drive the real HTTP transport against wiremock vendor servers:
//! - vendor wire formats and auth headers
//! - fallback, circuit breaking and timeouts
//! - response caching
//! - rate limiting
//! - configuration files loaded end to end

pub mod fixtures;
pub mod helpers;
pub mod mock_providers;

// Re-export commonly used items
pub use fixtures::*;
pub use helpers::*;
pub use mock_providers::*;

#[cfg(test)]
mod cache_tests;
#[cfg(test)]
mod e2e_tests;
#[cfg(test)]
mod provider_tests;
#[cfg(test)]
mod rate_limit_tests;
#[cfg(test)]
mod routing_tests;
