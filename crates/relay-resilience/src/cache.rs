//! Response cache keyed by request fingerprint.
//!
//! [`ResponseCache`] owns the expiry rule: an entry read at or after its
//! `expires_at` is deleted and reported as absent. Storage is delegated to a
//! [`CacheBackend`], so a shared store can replace the in-memory default.
//! Backend failures never fail a request; reads degrade to a miss.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Longest lifetime given to a cached response (about a century)
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Error types for cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Entry could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(String),

    /// Backend not available
    #[error("Cache backend not available: {0}")]
    Unavailable(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Storage behind the response cache
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value from the cache
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value with a time-to-live hint
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Delete a key
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Remove every key
    async fn clear(&self) -> CacheResult<()>;

    /// Number of stored keys
    async fn len(&self) -> CacheResult<usize>;

    /// Get backend name for logs
    fn name(&self) -> &'static str;
}

/// A cached successful response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request fingerprint
    pub fingerprint: Fingerprint,
    /// Generated text
    pub response: String,
    /// Provider that produced the text
    pub provider_id: String,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// First instant at which the entry is stale
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry expiring `ttl` from now
    pub fn new(
        fingerprint: Fingerprint,
        response: impl Into<String>,
        provider_id: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let created_at = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            fingerprint,
            response: response.into(),
            provider_id: provider_id.into(),
            created_at,
            expires_at: created_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Check if the entry is expired at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check if the entry is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Reads that returned an entry
    pub hits: u64,
    /// Reads that found nothing usable
    pub misses: u64,
    /// Reads that found and removed an expired entry
    pub expired: u64,
    /// Successful writes
    pub writes: u64,
    /// Backend or serialization failures
    pub errors: u64,
}

impl CacheStats {
    /// Hits over all reads
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            0.0
        } else {
            self.hits as f64 / reads as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

/// Response cache used by the orchestrator
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
    default_ttl: Duration,
    counters: Counters,
}

impl ResponseCache {
    /// Create a cache over a backend
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl: Duration) -> Self {
        Self {
            backend,
            default_ttl,
            counters: Counters::default(),
        }
    }

    /// Create a bounded in-memory cache
    #[must_use]
    pub fn in_memory(max_entries: usize, default_ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCacheBackend::new(max_entries)), default_ttl)
    }

    /// TTL applied by [`Self::put_default`]
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up a live entry
    ///
    /// An expired entry is deleted and reported as absent.
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        let bytes = match self.backend.get(fingerprint.as_str()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "Cache read failed");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(fingerprint = %fingerprint, error = %e, "Dropping undecodable cache entry");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                self.delete(fingerprint).await;
                return None;
            }
        };

        if entry.is_expired() {
            debug!(fingerprint = %fingerprint, "Cache entry expired");
            self.counters.expired.fetch_add(1, Ordering::Relaxed);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            self.delete(fingerprint).await;
            return None;
        }

        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry)
    }

    /// Store a response for `ttl`, capped at [`MAX_TTL`]
    pub async fn put(
        &self,
        fingerprint: &Fingerprint,
        response: &str,
        provider_id: &str,
        ttl: Duration,
    ) {
        let ttl = ttl.min(MAX_TTL);
        let entry = CacheEntry::new(fingerprint.clone(), response, provider_id, ttl);
        let bytes = match serde_json::to_vec(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode cache entry");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        match self.backend.set(fingerprint.as_str(), bytes, ttl).await {
            Ok(()) => {
                self.counters.writes.fetch_add(1, Ordering::Relaxed);
                debug!(
                    fingerprint = %fingerprint,
                    provider = %provider_id,
                    ttl_secs = ttl.as_secs(),
                    "Cached response"
                );
            }
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "Cache write failed");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Store a response for the default TTL
    pub async fn put_default(&self, fingerprint: &Fingerprint, response: &str, provider_id: &str) {
        self.put(fingerprint, response, provider_id, self.default_ttl)
            .await;
    }

    /// Remove one entry
    pub async fn invalidate(&self, fingerprint: &Fingerprint) {
        self.delete(fingerprint).await;
    }

    /// Remove every entry
    pub async fn clear(&self) {
        if let Err(e) = self.backend.clear().await {
            warn!(backend = self.backend.name(), error = %e, "Cache clear failed");
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of stored entries, expired ones included until they are read
    pub async fn len(&self) -> usize {
        self.backend.len().await.unwrap_or(0)
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Counter snapshot
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    async fn delete(&self, fingerprint: &Fingerprint) {
        if let Err(e) = self.backend.delete(fingerprint.as_str()).await {
            warn!(backend = self.backend.name(), error = %e, "Cache delete failed");
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("backend", &self.backend.name())
            .field("default_ttl", &self.default_ttl)
            .field("stats", &self.stats())
            .finish()
    }
}

#[derive(Debug)]
struct MemoryEntry {
    data: Vec<u8>,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<tokio::time::Instant>,
    hits: u64,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|at| tokio::time::Instant::now() >= at)
    }
}

/// Bounded in-memory cache backend
///
/// When full, expired entries are evicted first, then the least-hit ones.
#[derive(Debug)]
pub struct MemoryCacheBackend {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    max_entries: usize,
}

impl MemoryCacheBackend {
    /// Create a backend holding at most `max_entries` keys
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    fn evict_if_needed(&self, entries: &mut HashMap<String, MemoryEntry>, incoming: &str) {
        if entries.len() < self.max_entries || entries.contains_key(incoming) {
            return;
        }

        entries.retain(|_, entry| !entry.is_expired());

        if entries.len() >= self.max_entries {
            let to_remove = entries.len() - self.max_entries + 1;
            let mut hit_counts: Vec<(String, u64)> = entries
                .iter()
                .map(|(k, v)| (k.clone(), v.hits))
                .collect();
            hit_counts.sort_by_key(|(_, hits)| *hits);

            for (key, _) in hit_counts.into_iter().take(to_remove) {
                entries.remove(&key);
            }
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;
        Ok(entries.get_mut(key).map(|entry| {
            entry.hits += 1;
            entry.data.clone()
        }))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        self.evict_if_needed(&mut entries, key);
        entries.insert(
            key.to_string(),
            MemoryEntry {
                data: value,
                expires_at: tokio::time::Instant::now().checked_add(ttl),
                hits: 0,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn len(&self) -> CacheResult<usize> {
        Ok(self.entries.read().await.len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
