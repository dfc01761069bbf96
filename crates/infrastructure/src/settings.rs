//! Start-up settings and the factories built from them.
//!
//! Settings come from an optional file (format picked by extension) with
//! environment variables layered on top, e.g. `AUTHGATE__STORE__KIND=memory`.
//!
//! ```toml
//! [store]
//! kind = "file"
//! token_kind = "jwt"
//!
//! [providers.email]
//! service = "email_pass"
//! [providers.email.config]
//! base_url = "http://localhost:3000"
//! login = { endpoint = "/api/auth/login" }
//!
//! [providers.dummy]
//! service = "dummy"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use authgate_application::{
    AuthProvider, InMemoryTokenStore, ProviderError, ProviderRegistry, TokenStore, TokenStoreError,
};
use authgate_domain::TokenKind;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::adapters::SystemClock;
use crate::auth::{DummyAuthProvider, DummyConfig, EmailPassAuthProvider, EmailPassConfig};
use crate::persistence::{FileTokenStore, TokioFileSystem, default_token_path};

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "AUTHGATE";

/// Errors raised while loading settings or building from them.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings sources could not be read or deserialized.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// A provider endpoint is unusable.
    #[error("invalid endpoint for provider '{provider}': {reason}")]
    InvalidEndpoint {
        /// Provider name.
        provider: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No token path configured and no platform data directory.
    #[error("no token file path configured and no data directory available")]
    MissingTokenPath,

    /// The token store could not be opened.
    #[error("failed to open token store: {0}")]
    Store(#[from] TokenStoreError),
}

/// Where tokens live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// JSON file on disk.
    #[default]
    File,
    /// Process memory.
    Memory,
}

/// Token store settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Backend.
    pub kind: StoreKind,
    /// Token file location; defaults to [`default_token_path`].
    pub path: Option<PathBuf>,
    /// Representation tokens are normalized into.
    pub token_kind: TokenKind,
}

/// One configured provider, selected by its `service` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum ProviderSettings {
    /// [`EmailPassAuthProvider`].
    EmailPass {
        /// Provider settings.
        #[serde(default)]
        config: EmailPassConfig,
    },
    /// [`DummyAuthProvider`].
    Dummy {
        /// Provider settings.
        #[serde(default)]
        config: DummyConfig,
    },
}

impl ProviderSettings {
    fn build(&self, name: &str) -> Result<Arc<dyn AuthProvider>, SettingsError> {
        match self {
            Self::EmailPass { config } => {
                let provider = EmailPassAuthProvider::new(config.clone()).map_err(|e| {
                    let reason = match e {
                        ProviderError::Configuration(reason) => reason,
                        other => other.to_string(),
                    };
                    SettingsError::InvalidEndpoint {
                        provider: name.to_string(),
                        reason,
                    }
                })?;
                Ok(Arc::new(provider))
            }
            Self::Dummy { config } => Ok(Arc::new(DummyAuthProvider::new(config.clone()))),
        }
    }
}

/// Everything needed to assemble an [`AuthService`](authgate_application::AuthService).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Token store.
    pub store: StoreSettings,
    /// Providers by name.
    pub providers: BTreeMap<String, ProviderSettings>,
}

impl AuthSettings {
    /// Load settings from `path` (if any) and `AUTHGATE__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Load`] if the file is missing or malformed,
    /// or the merged settings do not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading settings file");
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

/// Build a registry holding every configured provider.
///
/// # Errors
///
/// Returns [`SettingsError::InvalidEndpoint`] if a provider cannot be built.
pub fn build_registry(settings: &AuthSettings) -> Result<ProviderRegistry, SettingsError> {
    let mut registry = ProviderRegistry::new();
    for (name, provider) in &settings.providers {
        registry.register(name.clone(), provider.build(name)?);
    }
    info!(providers = ?registry.names(), "Provider registry built");
    Ok(registry)
}

/// Open the configured token store.
///
/// # Errors
///
/// Returns an error if no file path can be determined or the token file
/// cannot be loaded.
pub async fn build_token_store(
    settings: &StoreSettings,
) -> Result<Arc<dyn TokenStore>, SettingsError> {
    let clock = Arc::new(SystemClock::new());
    match settings.kind {
        StoreKind::Memory => Ok(Arc::new(InMemoryTokenStore::new(settings.token_kind, clock))),
        StoreKind::File => {
            let path = settings
                .path
                .clone()
                .or_else(default_token_path)
                .ok_or(SettingsError::MissingTokenPath)?;
            let store =
                FileTokenStore::open(TokioFileSystem::new(), path, settings.token_kind, clock)
                    .await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use authgate_domain::AuthToken;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write_settings(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("authgate.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempdir().unwrap();
        let path = write_settings(
            dir.path(),
            r#"
[store]
kind = "memory"
token_kind = "jwt"

[providers.email]
service = "email_pass"
[providers.email.config]
base_url = "http://localhost:3000"
login = { endpoint = "/api/auth/login" }
logout = { endpoint = "/api/auth/logout", redirect = { success = "/auth/login", failure = "/auth/login" } }

[providers.dummy]
service = "dummy"
[providers.dummy.config]
delay = 1000
always_fail = true
"#,
        );

        let settings = AuthSettings::load(Some(&path)).unwrap();

        assert_eq!(settings.store.kind, StoreKind::Memory);
        assert_eq!(settings.store.token_kind, TokenKind::Jwt);
        let Some(ProviderSettings::Dummy { config }) = settings.providers.get("dummy") else {
            panic!("dummy provider missing");
        };
        assert_eq!(config.delay, 1000);
        assert!(config.always_fail);
        let Some(ProviderSettings::EmailPass { config }) = settings.providers.get("email") else {
            panic!("email provider missing");
        };
        assert_eq!(config.login.endpoint.as_deref(), Some("/api/auth/login"));
        assert_eq!(config.logout.redirect.failure.as_deref(), Some("/auth/login"));
    }

    #[test]
    fn test_provider_without_config_table() {
        let dir = tempdir().unwrap();
        let path = write_settings(dir.path(), "[providers.dummy]\nservice = \"dummy\"\n");

        let settings = AuthSettings::load(Some(&path)).unwrap();
        assert_eq!(
            settings.providers.get("dummy"),
            Some(&ProviderSettings::Dummy {
                config: DummyConfig::default()
            })
        );
    }

    #[test]
    fn test_unknown_service_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_settings(dir.path(), "[providers.x]\nservice = \"carrier_pigeon\"\n");

        assert!(matches!(
            AuthSettings::load(Some(&path)),
            Err(SettingsError::Load(_))
        ));
    }

    #[test]
    fn test_build_registry_reports_bad_endpoint() {
        let mut settings = AuthSettings::default();
        settings.providers.insert(
            "email".to_string(),
            ProviderSettings::EmailPass {
                config: EmailPassConfig {
                    login: crate::auth::OperationConfig::at("/login"),
                    ..EmailPassConfig::default()
                },
            },
        );

        let err = build_registry(&settings).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidEndpoint { ref provider, .. } if provider == "email"));
    }

    #[tokio::test]
    async fn test_build_file_store_at_configured_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        let settings = StoreSettings {
            kind: StoreKind::File,
            path: Some(path.clone()),
            token_kind: TokenKind::Simple,
        };

        let store = build_token_store(&settings).await.unwrap();
        store.set(AuthToken::new("abc123")).await.unwrap();

        assert!(path.exists());
    }
}
