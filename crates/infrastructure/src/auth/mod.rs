//! Auth provider implementations.

mod dummy_provider;
mod email_pass_provider;

pub use dummy_provider::{DummyAuthProvider, DummyConfig};
pub use email_pass_provider::{EmailPassAuthProvider, EmailPassConfig, HttpMethod, OperationConfig};
