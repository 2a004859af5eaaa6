//! Credential lookup seam.
//!
//! Providers reference credentials by an opaque key. Resolution happens once,
//! when the registry is built; the secret never appears in configuration.

use secrecy::SecretString;

/// Resolves a credential reference to its secret
pub trait CredentialResolver: Send + Sync {
    /// Look up the secret for a reference; `None` when it does not exist or is empty
    fn resolve(&self, credential_ref: &str) -> Option<SecretString>;
}
