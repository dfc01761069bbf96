//! Adapters for application ports that are not persistence.

mod system_clock;

pub use system_clock::SystemClock;
