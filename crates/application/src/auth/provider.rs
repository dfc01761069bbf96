//! Authentication provider trait.
//!
//! A provider encapsulates *how* one verification mechanism works (a network
//! call, a local stub, a third-party SDK). The orchestrator only ever looks
//! at the `AuthOutcome` it returns.

use async_trait::async_trait;
use authgate_domain::{AuthOutcome, AuthPayload};
use thiserror::Error;

/// Faults a provider could not turn into an outcome.
///
/// Rejected credentials or a failed registration are *not* errors; they are
/// returned as `Ok` outcomes with `is_failure() == true`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The underlying transport failed (connection refused, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with something that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider is not configured for the requested operation.
    #[error("provider misconfigured: {0}")]
    Configuration(String),
}

/// Capability contract for credential-verification backends.
///
/// Each operation resolves to exactly one outcome.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify credentials and, on success, return a token.
    ///
    /// # Errors
    ///
    /// Returns an error only for faults that are not business rejections.
    async fn authenticate(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError>;

    /// Create an account and, on success, optionally return a token.
    ///
    /// # Errors
    ///
    /// Returns an error only for faults that are not business rejections.
    async fn register(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError>;

    /// End the session on the backend side.
    ///
    /// # Errors
    ///
    /// Returns an error only for faults that are not business rejections.
    async fn logout(&self) -> Result<AuthOutcome, ProviderError>;

    /// Ask the backend to send password reset instructions.
    ///
    /// # Errors
    ///
    /// Returns an error only for faults that are not business rejections.
    async fn request_password(&self, payload: &AuthPayload)
    -> Result<AuthOutcome, ProviderError>;

    /// Set new credentials.
    ///
    /// # Errors
    ///
    /// Returns an error only for faults that are not business rejections.
    async fn reset_password(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError>;
}
