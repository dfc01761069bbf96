//! Auth orchestrator.
//!
//! `AuthService` is the façade application code talks to. It resolves a
//! provider by name, delegates the operation, and keeps the token store in
//! step with the outcome. A token returned by a provider is never handed
//! to the caller as-is: it is written to the store and the store's own
//! read-back replaces it in the outcome.

use std::sync::Arc;

use authgate_domain::{AuthOutcome, AuthPayload, AuthToken};
use tracing::{debug, info, warn};

use super::changes::{AuthenticationChanges, TokenChanges, is_present};
use super::registry::ProviderRegistry;
use super::token_store::TokenStore;
use crate::error::ApplicationResult;

/// Orchestrates providers and the token store.
#[derive(Clone)]
pub struct AuthService {
    registry: ProviderRegistry,
    store: Arc<dyn TokenStore>,
}

impl AuthService {
    /// Creates a new `AuthService`.
    #[must_use]
    pub fn new(registry: ProviderRegistry, store: Arc<dyn TokenStore>) -> Self {
        Self { registry, store }
    }

    /// The providers this service can dispatch to.
    #[must_use]
    pub const fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The current token, read straight from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn token(&self) -> ApplicationResult<Option<AuthToken>> {
        Ok(self.store.get().await?)
    }

    /// Whether a non-empty token is currently stored.
    ///
    /// Expiry is not consulted; an expired token still counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn is_authenticated(&self) -> ApplicationResult<bool> {
        Ok(is_present(self.token().await?.as_ref()))
    }

    /// Token changes, exactly as the store publishes them.
    #[must_use]
    pub fn token_changes(&self) -> TokenChanges {
        self.store.changes()
    }

    /// Token changes mapped to authentication state.
    #[must_use]
    pub fn authentication_changes(&self) -> AuthenticationChanges {
        self.token_changes().authenticated()
    }

    /// Authenticates with the named provider and stores the received token.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not registered, or if the
    /// provider or token store fails outside of a modeled outcome.
    pub async fn authenticate(
        &self,
        provider: &str,
        payload: &AuthPayload,
    ) -> ApplicationResult<AuthOutcome> {
        let backend = self.registry.resolve(provider)?;
        debug!(provider = %provider, "Delegating authenticate");
        let outcome = backend.authenticate(payload).await?;
        self.write_through(provider, outcome).await
    }

    /// Registers with the named provider and stores the received token.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not registered, or if the
    /// provider or token store fails outside of a modeled outcome.
    pub async fn register(
        &self,
        provider: &str,
        payload: &AuthPayload,
    ) -> ApplicationResult<AuthOutcome> {
        let backend = self.registry.resolve(provider)?;
        debug!(provider = %provider, "Delegating register");
        let outcome = backend.register(payload).await?;
        self.write_through(provider, outcome).await
    }

    /// Signs out with the named provider and, on success, clears the store.
    ///
    /// The clear completes before this returns, but its failure is only
    /// logged; the returned outcome is the provider's.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not registered or fails outside
    /// of a modeled outcome.
    pub async fn logout(&self, provider: &str) -> ApplicationResult<AuthOutcome> {
        let backend = self.registry.resolve(provider)?;
        debug!(provider = %provider, "Delegating logout");
        let outcome = backend.logout().await?;

        if outcome.is_success() {
            match self.store.clear().await {
                Ok(()) => info!(provider = %provider, "Token cleared after logout"),
                Err(e) => {
                    warn!(provider = %provider, error = %e, "Failed to clear token after logout");
                }
            }
        }

        Ok(outcome)
    }

    /// Sends a password reset request to the named provider.
    ///
    /// Never touches the token store.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not registered or fails outside
    /// of a modeled outcome.
    pub async fn request_password(
        &self,
        provider: &str,
        payload: &AuthPayload,
    ) -> ApplicationResult<AuthOutcome> {
        let backend = self.registry.resolve(provider)?;
        debug!(provider = %provider, "Delegating request_password");
        Ok(backend.request_password(payload).await?)
    }

    /// Resets the password with the named provider.
    ///
    /// Never touches the token store.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not registered or fails outside
    /// of a modeled outcome.
    pub async fn reset_password(
        &self,
        provider: &str,
        payload: &AuthPayload,
    ) -> ApplicationResult<AuthOutcome> {
        let backend = self.registry.resolve(provider)?;
        debug!(provider = %provider, "Delegating reset_password");
        Ok(backend.reset_password(payload).await?)
    }

    /// Store the outcome's token and substitute the store's canonical copy.
    async fn write_through(
        &self,
        provider: &str,
        mut outcome: AuthOutcome,
    ) -> ApplicationResult<AuthOutcome> {
        if !outcome.is_success() {
            return Ok(outcome);
        }
        if !outcome.has_token() {
            // an empty token is no token; it never reaches the caller
            if outcome.token().is_some() {
                outcome.replace_token(None);
            }
            return Ok(outcome);
        }
        let Some(mut token) = outcome.token().cloned() else {
            return Ok(outcome);
        };
        if token.owner.is_none() {
            token = token.with_owner(provider);
        }

        // set must complete before get so the read observes this write
        self.store.set(token).await?;
        let canonical = self.store.get().await?;
        info!(provider = %provider, "Token stored");

        outcome.replace_token(canonical);
        Ok(outcome)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::significant_drop_tightening
)]
mod tests {
    use super::*;
    use crate::auth::{
        AuthProvider, ChangesError, InMemoryTokenStore, ProviderError, TokenStoreError,
    };
    use crate::error::ApplicationError;
    use crate::ports::Clock;
    use async_trait::async_trait;
    use authgate_domain::TokenKind;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        }
    }

    /// Provider returning canned outcomes and counting calls.
    struct StubProvider {
        outcome: AuthOutcome,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(outcome: AuthOutcome) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
            }
        }

        fn respond(&self) -> Result<AuthOutcome, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome.clone())
        }
    }

    #[async_trait]
    impl AuthProvider for StubProvider {
        async fn authenticate(&self, _: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
            self.respond()
        }

        async fn register(&self, _: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
            self.respond()
        }

        async fn logout(&self) -> Result<AuthOutcome, ProviderError> {
            self.respond()
        }

        async fn request_password(&self, _: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
            self.respond()
        }

        async fn reset_password(&self, _: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
            self.respond()
        }
    }

    /// Provider whose transport is down.
    struct BrokenProvider;

    #[async_trait]
    impl AuthProvider for BrokenProvider {
        async fn authenticate(&self, _: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
            Err(ProviderError::Transport("connection refused".to_string()))
        }

        async fn register(&self, _: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
            Err(ProviderError::Transport("connection refused".to_string()))
        }

        async fn logout(&self) -> Result<AuthOutcome, ProviderError> {
            Err(ProviderError::Transport("connection refused".to_string()))
        }

        async fn request_password(&self, _: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
            Err(ProviderError::Transport("connection refused".to_string()))
        }

        async fn reset_password(&self, _: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
            Err(ProviderError::Transport("connection refused".to_string()))
        }
    }

    /// Store that records every call and can refuse to clear.
    struct RecordingStore {
        inner: InMemoryTokenStore,
        calls: Mutex<Vec<&'static str>>,
        fail_clear: bool,
    }

    impl RecordingStore {
        fn new(fail_clear: bool) -> Self {
            Self {
                inner: InMemoryTokenStore::new(TokenKind::Simple, Arc::new(FixedClock)),
                calls: Mutex::new(Vec::new()),
                fail_clear,
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TokenStore for RecordingStore {
        async fn get(&self) -> Result<Option<AuthToken>, TokenStoreError> {
            self.calls.lock().unwrap().push("get");
            self.inner.get().await
        }

        async fn set(&self, token: AuthToken) -> Result<(), TokenStoreError> {
            self.calls.lock().unwrap().push("set");
            self.inner.set(token).await
        }

        async fn clear(&self) -> Result<(), TokenStoreError> {
            self.calls.lock().unwrap().push("clear");
            if self.fail_clear {
                return Err(TokenStoreError::Serialization("disk full".to_string()));
            }
            self.inner.clear().await
        }

        fn changes(&self) -> TokenChanges {
            self.inner.changes()
        }
    }

    fn credentials() -> AuthPayload {
        AuthPayload::from(json!({"email": "a@b.com", "password": "x"}))
    }

    fn service_with(provider: StubProvider) -> (AuthService, Arc<StubProvider>, Arc<RecordingStore>) {
        let provider = Arc::new(provider);
        let store = Arc::new(RecordingStore::new(false));
        let registry = ProviderRegistry::new().with_provider("email", provider.clone());
        (AuthService::new(registry, store.clone()), provider, store)
    }

    #[tokio::test]
    async fn test_failed_authenticate_leaves_store_untouched() {
        let (service, _, store) = service_with(StubProvider::new(
            AuthOutcome::failed().with_messages("Invalid credentials"),
        ));
        let mut changes = service.token_changes();
        assert_eq!(changes.next().await.unwrap(), None);

        let outcome = service.authenticate("email", &credentials()).await.unwrap();

        assert!(outcome.is_failure());
        assert_eq!(outcome.messages(), vec!["Invalid credentials"]);
        assert!(outcome.token().is_none());
        assert_eq!(changes.try_next(), Err(ChangesError::Empty));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_successful_authenticate_substitutes_canonical_token() {
        let raw = AuthToken::new("abc123").with_owner("email");
        let (service, _, store) =
            service_with(StubProvider::new(AuthOutcome::succeeded().with_token(raw.clone())));
        let mut auth_changes = service.authentication_changes();
        assert!(!auth_changes.next().await.unwrap());

        let outcome = service.authenticate("email", &credentials()).await.unwrap();

        let returned = outcome.token().unwrap();
        assert_eq!(returned.value(), "abc123");
        assert_ne!(returned, &raw);
        assert_eq!(
            returned.created_at,
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        );
        assert_eq!(service.token().await.unwrap().as_ref(), Some(returned));
        assert_eq!(store.calls(), vec!["set", "get", "get"]);
        assert!(auth_changes.next().await.unwrap());
        assert!(service.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_success_without_token_skips_store() {
        let (service, _, store) = service_with(StubProvider::new(
            AuthOutcome::succeeded().with_messages("Registered, check your email"),
        ));

        let outcome = service.register("email", &credentials()).await.unwrap();

        assert!(outcome.is_success());
        assert!(outcome.token().is_none());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_register_writes_through() {
        let (service, _, _) = service_with(StubProvider::new(
            AuthOutcome::succeeded().with_token(AuthToken::new("fresh")),
        ));

        let outcome = service.register("email", &credentials()).await.unwrap();

        assert_eq!(outcome.token().map(AuthToken::value), Some("fresh"));
        assert_eq!(outcome.token().unwrap().owner.as_deref(), Some("email"));
        assert!(service.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_failure_with_token_is_not_stored() {
        let (service, _, store) = service_with(StubProvider::new(
            AuthOutcome::failed().with_token(AuthToken::new("leaked")),
        ));

        let outcome = service.authenticate("email", &credentials()).await.unwrap();

        assert_eq!(outcome.token().map(AuthToken::value), Some("leaked"));
        assert!(store.calls().is_empty());
        assert!(!service.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_logout_clears_store() {
        let (service, _, store) =
            service_with(StubProvider::new(AuthOutcome::succeeded().with_redirect("/auth/login")));
        store.set(AuthToken::new("abc123")).await.unwrap();
        let mut changes = service.token_changes();
        assert!(changes.next().await.unwrap().is_some());

        let outcome = service.logout("email").await.unwrap();
        assert_eq!(outcome.redirect(), Some("/auth/login"));

        assert_eq!(changes.next().await.unwrap(), None);
        assert!(service.token().await.unwrap().is_none());
        assert!(!service.is_authenticated().await.unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_token_absent_as_soon_as_logout_returns() {
        let (service, _, _) = service_with(StubProvider::new(
            AuthOutcome::succeeded().with_token(AuthToken::new("abc123")),
        ));
        service.authenticate("email", &credentials()).await.unwrap();
        assert!(service.is_authenticated().await.unwrap());

        service.logout("email").await.unwrap();

        assert!(service.token().await.unwrap().is_none());
        assert!(!service.is_authenticated().await.unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_login_after_logout_keeps_new_token() {
        let (service, _, store) = service_with(StubProvider::new(
            AuthOutcome::succeeded().with_token(AuthToken::new("abc123")),
        ));
        service.authenticate("email", &credentials()).await.unwrap();
        service.logout("email").await.unwrap();

        let outcome = service.authenticate("email", &credentials()).await.unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(outcome.has_token());
        let stored = service.token().await.unwrap();
        assert_eq!(stored.as_ref(), outcome.token());
        assert_eq!(store.calls(), vec!["set", "get", "clear", "set", "get", "get"]);
    }

    #[tokio::test]
    async fn test_empty_token_is_dropped_from_outcome() {
        let (service, _, store) = service_with(StubProvider::new(
            AuthOutcome::succeeded().with_token(AuthToken::new("")),
        ));

        let outcome = service.authenticate("email", &credentials()).await.unwrap();

        assert!(outcome.is_success());
        assert!(outcome.token().is_none());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_token() {
        let (service, _, store) = service_with(StubProvider::new(AuthOutcome::failed()));
        store.set(AuthToken::new("abc123")).await.unwrap();

        let outcome = service.logout("email").await.unwrap();

        assert!(outcome.is_failure());
        assert!(service.is_authenticated().await.unwrap());
        assert!(!store.calls().contains(&"clear"));
    }

    #[tokio::test]
    async fn test_logout_ignores_clear_failure() {
        let provider = Arc::new(StubProvider::new(AuthOutcome::succeeded()));
        let store = Arc::new(RecordingStore::new(true));
        let registry = ProviderRegistry::new().with_provider("email", provider);
        let service = AuthService::new(registry, store.clone());
        store.set(AuthToken::new("abc123")).await.unwrap();

        let outcome = service.logout("email").await.unwrap();

        assert!(outcome.is_success());
        assert!(store.calls().contains(&"clear"));
        assert!(service.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_password_operations_never_touch_store() {
        let (service, provider, store) = service_with(StubProvider::new(
            AuthOutcome::succeeded()
                .with_token(AuthToken::new("ignored"))
                .with_messages("Reset password instructions have been sent to your email."),
        ));
        let mut changes = service.token_changes();
        changes.next().await.unwrap();

        let requested = service
            .request_password("email", &AuthPayload::from(json!({"email": "a@b.com"})))
            .await
            .unwrap();
        let reset = service
            .reset_password("email", &AuthPayload::from(json!({"password": "new"})))
            .await
            .unwrap();

        assert!(requested.is_success());
        assert_eq!(requested.token().map(AuthToken::value), Some("ignored"));
        assert!(reset.is_success());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(store.calls().is_empty());
        assert_eq!(changes.try_next(), Err(ChangesError::Empty));
    }

    #[tokio::test]
    async fn test_unregistered_provider_fails_before_any_call() {
        let (service, provider, store) =
            service_with(StubProvider::new(AuthOutcome::succeeded()));

        let err = service.authenticate("github", &credentials()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::UnregisteredProvider(ref name) if name == "github"));
        assert!(service.logout("github").await.is_err());
        assert!(service.request_password("github", &credentials()).await.is_err());

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provider_fault_propagates() {
        let store = Arc::new(RecordingStore::new(false));
        let registry = ProviderRegistry::new().with_provider("email", Arc::new(BrokenProvider));
        let service = AuthService::new(registry, store.clone());

        let err = service.authenticate("email", &credentials()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Provider(ProviderError::Transport(_))));
        assert!(store.calls().is_empty());
    }
}
