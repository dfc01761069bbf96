//! Authgate Application - Ports and auth orchestration
//!
//! This crate defines the application layer with:
//! - Port traits (token store, auth providers, clock, file system)
//! - The provider registry and the `AuthService` orchestrator
//! - Token change notifications with replay-latest semantics
//! - Application-level error handling

pub mod auth;
pub mod error;
pub mod ports;

pub use auth::{
    AuthProvider, AuthService, AuthenticationChanges, ChangesError, InMemoryTokenStore,
    ProviderError, ProviderRegistry, TokenChanges, TokenNotifier, TokenStore, TokenStoreError,
};
pub use error::{ApplicationError, ApplicationResult};
