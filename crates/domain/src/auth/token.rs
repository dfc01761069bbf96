//! Authentication token value
//!
//! A token is an opaque string plus the metadata the token store attaches
//! when it takes ownership of it. Nothing here verifies signatures: decoding
//! a JWT payload only extracts metadata such as the expiry claim.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{DomainError, DomainResult};

/// How a token store interprets the raw value it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Opaque bearer string.
    #[default]
    Simple,
    /// JSON Web Token; the payload is decoded for its `exp` claim.
    Jwt,
}

/// Authentication token with ownership and expiry metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    /// The raw token string
    pub value: String,
    /// How the value is interpreted
    #[serde(default)]
    pub kind: TokenKind,
    /// Name of the provider that produced the token (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// When the token was created or last written to a store
    pub created_at: DateTime<Utc>,
    /// When the token expires (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Additional provider-specific information
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl AuthToken {
    /// Create a simple token from a raw value, stamped with the current time.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TokenKind::Simple,
            owner: None,
            created_at: Utc::now(),
            expires_at: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the provider that produced this token.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set an explicit expiry.
    #[must_use]
    pub const fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the raw token string.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if the token carries a non-empty value.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.value.is_empty()
    }

    /// Returns true if an expiry is known and has passed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Time until expiry in seconds, or None if no expiry.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|exp| (exp - now).num_seconds())
    }

    /// Normalize the token into the given kind, as a token store does when
    /// it takes ownership of a value.
    ///
    /// The creation time is re-stamped with `now`. For [`TokenKind::Jwt`] the
    /// expiry is taken from the payload's `exp` claim when one can be decoded;
    /// an undecodable value keeps whatever expiry it already had.
    #[must_use]
    pub fn wrap(mut self, kind: TokenKind, now: DateTime<Utc>) -> Self {
        self.kind = kind;
        self.created_at = now;
        if kind == TokenKind::Jwt
            && let Ok(payload) = self.jwt_payload()
            && let Some(exp) = expiry_claim(&payload)
        {
            self.expires_at = Some(exp);
        }
        self
    }

    /// Decode the (unverified) payload segment of a JWT value.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MalformedToken`] if the value is not three
    /// dot-separated segments, the payload is not base64url, or it does not
    /// decode to a JSON object.
    pub fn jwt_payload(&self) -> DomainResult<Map<String, Value>> {
        let mut segments = self.value.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(DomainError::MalformedToken(
                "expected three dot-separated segments".to_string(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| DomainError::MalformedToken(format!("payload is not base64url: {e}")))?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(DomainError::MalformedToken(
                "payload is not a JSON object".to_string(),
            )),
            Err(e) => Err(DomainError::MalformedToken(format!(
                "payload is not JSON: {e}"
            ))),
        }
    }
}

fn expiry_claim(payload: &Map<String, Value>) -> Option<DateTime<Utc>> {
    let exp = payload.get("exp")?;
    #[allow(clippy::cast_possible_truncation)]
    let secs = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    DateTime::from_timestamp(secs, 0)
}
