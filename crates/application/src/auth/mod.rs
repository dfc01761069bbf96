//! Authentication module for Authgate.
//!
//! This module provides:
//! - The `AuthProvider` capability trait implemented by each verification backend
//! - The `TokenStore` port and an in-memory implementation
//! - Token change notifications with replay-latest semantics
//! - The `ProviderRegistry` name lookup table
//! - The `AuthService` orchestrator used by application code

mod changes;
mod provider;
mod registry;
mod service;
mod token_store;

pub use changes::{AuthenticationChanges, ChangesError, TokenChanges, TokenNotifier};
pub use provider::{AuthProvider, ProviderError};
pub use registry::ProviderRegistry;
pub use service::AuthService;
pub use token_store::{InMemoryTokenStore, TokenStore, TokenStoreError};
