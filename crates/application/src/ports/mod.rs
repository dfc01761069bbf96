//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.
//! The auth-specific ports (`TokenStore`, `AuthProvider`) live in [`crate::auth`].

mod clock;
mod file_system;

pub use clock::Clock;
pub use file_system::{FileSystem, FileSystemError};
