//! # Relay Providers
//!
//! Protocol adapters, the HTTP transport, and the provider registry.
//!
//! One adapter per protocol family:
//! - OpenAI-compatible chat completions
//! - Google Generative Language (Gemini)
//! - Cohere chat
//! - Bespoke REST backends described by a `RestShape`
//!
//! The registry binds each configured provider to its adapter and resolved
//! credential, and builds the ordered fallback chain for a task type.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod common;
pub mod registry;
pub mod transport;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "google")]
pub mod google;

#[cfg(feature = "cohere")]
pub mod cohere;

#[cfg(feature = "rest")]
pub mod rest;

// Re-export main types
pub use registry::{adapter_for, ExcludedProvider, ProviderEntry, ProviderRegistry};
pub use transport::HttpTransport;

#[cfg(feature = "openai")]
pub use openai::OpenAiAdapter;

#[cfg(feature = "google")]
pub use google::GoogleAdapter;

#[cfg(feature = "cohere")]
pub use cohere::CohereAdapter;

#[cfg(feature = "rest")]
pub use rest::RestAdapter;
