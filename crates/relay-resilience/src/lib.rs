//! # Relay Resilience
//!
//! Per-provider admission control and response caching for the relay:
//! - Circuit breaker and health score per provider
//! - Fixed-window rate limiter per provider
//! - Response cache with pluggable backends

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod circuit_breaker;
pub mod rate_limiter;

// Re-export main types
pub use cache::{
    CacheBackend, CacheEntry, CacheError, CacheResult, CacheStats, MemoryCacheBackend,
    ResponseCache, MAX_TTL,
};
pub use circuit_breaker::{
    AttemptPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState, HealthTracker,
    ProviderHealth,
};
pub use rate_limiter::{RateLimiter, RATE_WINDOW};
