//! Redirect hints forwarded in outcomes

use serde::{Deserialize, Serialize};

/// Destinations a caller may navigate to after an operation.
///
/// Hints are opaque: they are copied into the outcome and never followed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectHints {
    /// Destination after a successful operation
    #[serde(default)]
    pub success: Option<String>,
    /// Destination after a failed operation
    #[serde(default)]
    pub failure: Option<String>,
}

impl RedirectHints {
    /// Hints with both destinations set.
    #[must_use]
    pub fn new(success: impl Into<String>, failure: impl Into<String>) -> Self {
        Self {
            success: Some(success.into()),
            failure: Some(failure.into()),
        }
    }

    /// Pick the hint matching an operation result.
    #[must_use]
    pub fn for_result(&self, success: bool) -> Option<&str> {
        if success {
            self.success.as_deref()
        } else {
            self.failure.as_deref()
        }
    }
}
