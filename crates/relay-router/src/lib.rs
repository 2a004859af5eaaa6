//! # Relay Router
//!
//! The fallback orchestrator: one entry point that checks the response
//! cache, builds the candidate chain and walks it under circuit breaking and
//! rate limiting until a provider answers or the chain is exhausted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod orchestrator;
pub mod status;

pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use status::ProviderStatus;
