//! Credential resolvers.
//!
//! A provider record names its credential by reference; the resolver turns
//! the reference into a secret. Blank values count as missing.

use relay_core::CredentialResolver;
use secrecy::SecretString;
use std::collections::HashMap;

/// Resolves credential references as environment variable names
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialResolver;

impl EnvCredentialResolver {
    /// Create a resolver over the process environment
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CredentialResolver for EnvCredentialResolver {
    fn resolve(&self, credential_ref: &str) -> Option<SecretString> {
        std::env::var(credential_ref)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(SecretString::new)
    }
}

/// Resolves credential references from a fixed table
#[derive(Default)]
pub struct StaticCredentialResolver {
    credentials: HashMap<String, SecretString>,
}

impl StaticCredentialResolver {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential
    #[must_use]
    pub fn with_credential(
        mut self,
        credential_ref: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.credentials
            .insert(credential_ref.into(), SecretString::new(secret.into()));
        self
    }
}

impl std::fmt::Debug for StaticCredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut refs: Vec<&str> = self.credentials.keys().map(String::as_str).collect();
        refs.sort_unstable();
        f.debug_struct("StaticCredentialResolver")
            .field("refs", &refs)
            .finish()
    }
}

impl CredentialResolver for StaticCredentialResolver {
    fn resolve(&self, credential_ref: &str) -> Option<SecretString> {
        use secrecy::ExposeSecret;

        self.credentials
            .get(credential_ref)
            .filter(|secret| !secret.expose_secret().trim().is_empty())
            .cloned()
    }
}
