//! Authgate Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: token stores, auth providers,
//! and the settings that wire them together.

pub mod adapters;
pub mod auth;
pub mod persistence;
pub mod serialization;
pub mod settings;

pub use adapters::SystemClock;
pub use auth::{
    DummyAuthProvider, DummyConfig, EmailPassAuthProvider, EmailPassConfig, HttpMethod,
    OperationConfig,
};
pub use persistence::{FileTokenStore, TokioFileSystem, default_token_path};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
pub use settings::{
    AuthSettings, ProviderSettings, SettingsError, StoreKind, StoreSettings, build_registry,
    build_token_store,
};
