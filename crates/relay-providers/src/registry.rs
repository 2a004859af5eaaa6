//! Provider registry and fallback chain builder.
//!
//! The registry is built once at startup and is read-only afterwards. Each
//! entry binds a validated [`ProviderConfig`] to its protocol adapter and the
//! credential resolved for it.

use relay_core::{
    CredentialResolver, GenerationRequest, HealthLookup, ProtocolAdapter, ProtocolKind,
    ProviderConfig, RelayError, RelayResult, WireRequest,
};
use secrecy::SecretString;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A registered provider: configuration, adapter and credential
pub struct ProviderEntry {
    config: ProviderConfig,
    adapter: Arc<dyn ProtocolAdapter>,
    credential: SecretString,
}

impl ProviderEntry {
    /// Bind a provider to an adapter and credential
    pub fn new(
        config: ProviderConfig,
        adapter: Arc<dyn ProtocolAdapter>,
        credential: SecretString,
    ) -> Self {
        Self {
            config,
            adapter,
            credential,
        }
    }

    /// Provider id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Provider configuration
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Bound adapter
    #[must_use]
    pub fn adapter(&self) -> &Arc<dyn ProtocolAdapter> {
        &self.adapter
    }

    /// Encode a request for this provider
    #[must_use]
    pub fn encode(&self, request: &GenerationRequest) -> WireRequest {
        self.adapter.encode(request, &self.config, &self.credential)
    }
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("id", &self.config.id)
            .field("protocol", &self.adapter.kind())
            .field("endpoint", &self.config.endpoint)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

/// A configured provider left out of the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedProvider {
    /// Provider id
    pub id: String,
    /// Why it was excluded
    pub reason: String,
}

/// Build the adapter for a provider's protocol
///
/// # Errors
/// Returns `RelayError::InvalidProvider` when the protocol's adapter is not
/// compiled in, or a REST provider has no shape
pub fn adapter_for(config: &ProviderConfig) -> RelayResult<Arc<dyn ProtocolAdapter>> {
    match config.protocol {
        #[cfg(feature = "openai")]
        ProtocolKind::OpenAi => Ok(Arc::new(crate::openai::OpenAiAdapter::new())),
        #[cfg(feature = "google")]
        ProtocolKind::Google => Ok(Arc::new(crate::google::GoogleAdapter::new())),
        #[cfg(feature = "cohere")]
        ProtocolKind::Cohere => Ok(Arc::new(crate::cohere::CohereAdapter::new())),
        #[cfg(feature = "rest")]
        ProtocolKind::Rest => {
            let shape = config.rest.clone().ok_or_else(|| {
                RelayError::invalid_provider(&config.id, "protocol 'rest' requires a 'rest' shape")
            })?;
            Ok(Arc::new(crate::rest::RestAdapter::new(shape)))
        }
        #[allow(unreachable_patterns)]
        other => Err(RelayError::invalid_provider(
            &config.id,
            format!("protocol '{other}' is not enabled in this build"),
        )),
    }
}

/// Registry of usable providers
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    entries: Vec<Arc<ProviderEntry>>,
    excluded: Vec<ExcludedProvider>,
}

impl ProviderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration records
    ///
    /// Every record is validated first; an invalid record or a duplicate id
    /// fails the whole build. Providers without a usable credential are
    /// excluded with a warning and reported by [`Self::excluded`].
    ///
    /// # Errors
    /// Returns the first validation error or duplicate id
    pub fn from_configs(
        configs: &[ProviderConfig],
        resolver: &dyn CredentialResolver,
    ) -> RelayResult<Self> {
        let mut seen = HashSet::new();
        for config in configs {
            config.check()?;
            if !seen.insert(config.id.as_str()) {
                return Err(RelayError::DuplicateProvider(config.id.clone()));
            }
        }

        let mut registry = Self::new();
        for config in configs {
            let Some(credential_ref) = config.credential_ref() else {
                warn!(provider = %config.id, "No credential_ref configured, skipping provider");
                registry.exclude(&config.id, "missing credential_ref");
                continue;
            };

            let Some(credential) = resolver.resolve(credential_ref) else {
                warn!(
                    provider = %config.id,
                    credential_ref = %credential_ref,
                    "Credential could not be resolved, skipping provider"
                );
                registry.exclude(&config.id, format!("credential '{credential_ref}' not found"));
                continue;
            };

            registry.register(config.clone(), credential)?;
        }

        info!(
            providers = registry.len(),
            excluded = registry.excluded.len(),
            "Provider registry initialized"
        );

        Ok(registry)
    }

    /// Register a provider with the adapter for its protocol
    ///
    /// # Errors
    /// Returns an error if the record is invalid, the id is taken, or the
    /// protocol is unavailable
    pub fn register(&mut self, config: ProviderConfig, credential: SecretString) -> RelayResult<()> {
        let adapter = adapter_for(&config)?;
        self.register_with_adapter(config, adapter, credential)
    }

    /// Register a provider with an explicit adapter
    ///
    /// # Errors
    /// Returns an error if the record is invalid or the id is taken
    pub fn register_with_adapter(
        &mut self,
        config: ProviderConfig,
        adapter: Arc<dyn ProtocolAdapter>,
        credential: SecretString,
    ) -> RelayResult<()> {
        config.check()?;
        if self.get(&config.id).is_some() {
            return Err(RelayError::DuplicateProvider(config.id));
        }

        debug!(
            provider = %config.id,
            protocol = %adapter.kind(),
            priority = config.priority,
            capabilities = ?config.capabilities,
            "Registered provider"
        );

        self.entries
            .push(Arc::new(ProviderEntry::new(config, adapter, credential)));
        Ok(())
    }

    fn exclude(&mut self, id: &str, reason: impl Into<String>) {
        self.excluded.push(ExcludedProvider {
            id: id.to_string(),
            reason: reason.into(),
        });
    }

    /// Look up a provider by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<ProviderEntry>> {
        self.entries.iter().find(|e| e.id() == id).cloned()
    }

    /// Registered providers, in registration order
    #[must_use]
    pub fn providers(&self) -> &[Arc<ProviderEntry>] {
        &self.entries
    }

    /// Providers left out at build time
    #[must_use]
    pub fn excluded(&self) -> &[ExcludedProvider] {
        &self.excluded
    }

    /// Number of registered providers
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no provider is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ordered fallback chain for a task type
    ///
    /// Candidates declare the task type or `general`. They are ordered by
    /// exact match first, then ascending priority, then descending health
    /// score; remaining ties keep registration order. Open circuits are not
    /// filtered out here. An empty chain is a valid result.
    #[must_use]
    pub fn build_chain(&self, task_type: &str, health: &dyn HealthLookup) -> Vec<Arc<ProviderEntry>> {
        // Scores are read once so the sort sees a consistent snapshot
        let mut candidates: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.config.serves(task_type))
            .map(|e| {
                let key = (
                    !e.config.has_capability(task_type),
                    e.config.priority,
                    Reverse(health.health_score(e.id())),
                );
                (key, Arc::clone(e))
            })
            .collect();

        candidates.sort_by_key(|(key, _)| *key);
        candidates.into_iter().map(|(_, e)| e).collect()
    }
}
