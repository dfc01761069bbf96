//! Application error types

use thiserror::Error;

use crate::auth::{ProviderError, TokenStoreError};

/// Application-level errors.
///
/// Business rejections (bad credentials, failed registration) are never
/// errors: they come back as a failed `AuthOutcome`. These variants cover
/// configuration mistakes and infrastructure faults only.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// No provider is registered under the requested name.
    #[error("auth provider '{0}' is not registered")]
    UnregisteredProvider(String),

    /// A provider failed outside of its modeled outcomes.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The token store failed.
    #[error("token store error: {0}")]
    Store(#[from] TokenStoreError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
