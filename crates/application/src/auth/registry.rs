//! Provider registry: name → provider instance.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::error;

use super::provider::AuthProvider;
use crate::error::{ApplicationError, ApplicationResult};

/// Explicit table of the auth providers an application is configured with.
///
/// Built once at start-up and handed to the [`AuthService`](super::AuthService).
/// Looking up a name that was never registered is a configuration bug and
/// fails loudly; there is no fallback provider.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn AuthProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_provider(mut self, name: impl Into<String>, provider: Arc<dyn AuthProvider>) -> Self {
        self.register(name, provider);
        self
    }

    /// Register a provider under `name`, returning any provider it replaces.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn AuthProvider>,
    ) -> Option<Arc<dyn AuthProvider>> {
        self.providers.insert(name.into(), provider)
    }

    /// Resolve a provider by name.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::UnregisteredProvider`] if `name` has no entry.
    pub fn resolve(&self, name: &str) -> ApplicationResult<Arc<dyn AuthProvider>> {
        self.providers.get(name).cloned().ok_or_else(|| {
            error!(provider = %name, registered = ?self.names(), "Auth provider is not registered");
            ApplicationError::UnregisteredProvider(name.to_string())
        })
    }

    /// Returns true if a provider is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
