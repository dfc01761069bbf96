//! Opaque operation payload handed to providers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Credentials, registration data or identifiers for one auth operation.
///
/// The orchestrator never looks inside; providers decide which keys they
/// need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthPayload(Value);

impl AuthPayload {
    /// Create a payload from any JSON value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// An empty JSON object.
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Look up a top-level string field.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Borrow the underlying JSON value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the payload, returning the underlying JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for AuthPayload {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for AuthPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_str() {
        let payload = AuthPayload::from(json!({"email": "a@b.com", "remember": true}));
        assert_eq!(payload.get_str("email"), Some("a@b.com"));
        assert_eq!(payload.get_str("remember"), None);
        assert_eq!(payload.get_str("missing"), None);
    }

    #[test]
    fn test_default_is_empty_object() {
        assert_eq!(AuthPayload::default().as_value(), &json!({}));
    }
}
