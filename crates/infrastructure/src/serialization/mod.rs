//! Deterministic JSON serialization for persisted token files.
//!
//! Output is stable across writes:
//! - Struct fields in declaration order, map keys sorted (`BTreeMap`)
//! - 2-space indentation
//! - Trailing newline

mod json;

pub use json::*;
