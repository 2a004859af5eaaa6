//! # Relay Core
//!
//! Core types, traits, and error handling for the LLM relay orchestrator.
//!
//! This crate provides the foundational types used throughout the relay:
//! - Provider configuration and protocol selection
//! - Generation requests and their cache fingerprints
//! - Attempt records and orchestration results
//! - The protocol adapter and transport seams
//! - Error types and the error taxonomy surfaced to callers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod credentials;
pub mod error;
pub mod provider;
pub mod request;
pub mod result;

// Re-export commonly used types
pub use adapter::{ProtocolAdapter, Transport, WireRequest, WireResponse};
pub use credentials::CredentialResolver;
pub use error::{ErrorKind, ProtocolError, RelayError, RelayResult};
pub use provider::{HealthLookup, ProtocolKind, ProviderConfig, RestShape};
pub use request::{Fingerprint, GenerationRequest};
pub use result::{AttemptOutcome, AttemptRecord, OrchestrationResult, CACHE_PROVIDER};
