//! Local stub provider for development and tests.
//!
//! Answers every operation without any network traffic, after an optional
//! artificial delay.

use std::time::Duration;

use async_trait::async_trait;
use authgate_application::{AuthProvider, ProviderError};
use authgate_domain::{AuthOutcome, AuthPayload, AuthToken};
use serde::Deserialize;
use tracing::debug;

const FAILURE_ERROR: &str = "Something went wrong.";
const REDIRECT: &str = "/";

/// Settings for [`DummyAuthProvider`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DummyConfig {
    /// Artificial latency in milliseconds.
    pub delay: u64,
    /// Fail every operation.
    pub always_fail: bool,
    /// Raw token handed out by successful `authenticate`/`register` calls.
    pub token: Option<String>,
    /// Messages attached to failed outcomes.
    pub failure_messages: Vec<String>,
}

/// Provider that succeeds or fails on command.
#[derive(Debug, Clone, Default)]
pub struct DummyAuthProvider {
    config: DummyConfig,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Authenticate,
    Register,
    Logout,
    RequestPassword,
    ResetPassword,
}

impl Operation {
    const fn success_message(self) -> &'static str {
        match self {
            Self::Authenticate => "Successfully logged in.",
            Self::Register => "Successfully registered.",
            Self::Logout => "Successfully logged out.",
            Self::RequestPassword => "Reset password instructions have been sent.",
            Self::ResetPassword => "Password has been successfully changed.",
        }
    }

    const fn issues_token(self) -> bool {
        matches!(self, Self::Authenticate | Self::Register)
    }
}

impl DummyAuthProvider {
    /// Create a provider from its settings.
    #[must_use]
    pub const fn new(config: DummyConfig) -> Self {
        Self { config }
    }

    /// Provider that always succeeds and hands out `token`.
    #[must_use]
    pub fn succeeding(token: impl Into<String>) -> Self {
        Self::new(DummyConfig {
            token: Some(token.into()),
            ..DummyConfig::default()
        })
    }

    /// Provider that always fails with the given messages.
    #[must_use]
    pub fn failing<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(DummyConfig {
            always_fail: true,
            failure_messages: messages.into_iter().map(Into::into).collect(),
            ..DummyConfig::default()
        })
    }

    /// Returns the provider settings.
    #[must_use]
    pub const fn config(&self) -> &DummyConfig {
        &self.config
    }

    async fn answer(&self, op: Operation, payload: Option<&AuthPayload>) -> AuthOutcome {
        if self.config.delay > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.delay)).await;
        }
        debug!(operation = ?op, fail = self.config.always_fail, "Dummy provider answering");

        let response = payload.map_or(serde_json::Value::Null, |p| p.as_value().clone());
        if self.config.always_fail {
            return AuthOutcome::failed()
                .with_response(response)
                .with_redirect(REDIRECT)
                .with_errors(FAILURE_ERROR)
                .with_messages(self.config.failure_messages.clone());
        }

        let outcome = AuthOutcome::succeeded()
            .with_response(response)
            .with_redirect(REDIRECT)
            .with_messages(op.success_message());
        match &self.config.token {
            Some(token) if op.issues_token() => outcome.with_token(AuthToken::new(token.clone())),
            _ => outcome,
        }
    }
}

#[async_trait]
impl AuthProvider for DummyAuthProvider {
    async fn authenticate(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
        Ok(self.answer(Operation::Authenticate, Some(payload)).await)
    }

    async fn register(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
        Ok(self.answer(Operation::Register, Some(payload)).await)
    }

    async fn logout(&self) -> Result<AuthOutcome, ProviderError> {
        Ok(self.answer(Operation::Logout, None).await)
    }

    async fn request_password(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
        Ok(self.answer(Operation::RequestPassword, Some(payload)).await)
    }

    async fn reset_password(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
        Ok(self.answer(Operation::ResetPassword, Some(payload)).await)
    }
}
