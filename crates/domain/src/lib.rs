//! Authgate Domain - Core authentication types
//!
//! This crate defines the value types shared by every layer of Authgate:
//! the authentication token, the uniform outcome of an auth operation and
//! the opaque payload handed to providers.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;

pub use auth::{AuthOutcome, AuthPayload, AuthToken, OutcomeMessages, RedirectHints, TokenKind};
pub use error::{DomainError, DomainResult};
