//! Durable persistence adapters.

mod file_system;
mod file_token_store;

pub use file_system::TokioFileSystem;
pub use file_token_store::{FileTokenStore, default_token_path};
