//! Uniform result of an authentication operation

use serde_json::Value;

use super::token::AuthToken;

/// Ordered list of human-readable strings attached to an outcome.
///
/// Providers may hand over a single string, an optional string or a list;
/// all of them normalize into one ordered sequence. Empty entries are kept
/// here and filtered when the outcome is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeMessages(Vec<String>);

impl OutcomeMessages {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Iterate the non-empty entries in order.
    pub fn non_empty(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str).filter(|s| !s.is_empty())
    }
}

impl From<()> for OutcomeMessages {
    fn from((): ()) -> Self {
        Self::new()
    }
}

impl From<&str> for OutcomeMessages {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for OutcomeMessages {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Option<String>> for OutcomeMessages {
    fn from(value: Option<String>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl From<Option<&str>> for OutcomeMessages {
    fn from(value: Option<&str>) -> Self {
        Self(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for OutcomeMessages {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl From<Vec<&str>> for OutcomeMessages {
    fn from(values: Vec<&str>) -> Self {
        Self(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OutcomeMessages {
    fn from(values: [&str; N]) -> Self {
        Self(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[String]> for OutcomeMessages {
    fn from(values: &[String]) -> Self {
        Self(values.to_vec())
    }
}

/// Result of any auth operation, successful or not.
///
/// `success` and `token` are independent: a password-reset request may
/// succeed without a token, and a failed login may still carry messages.
/// The token is the only field that changes after construction, when the
/// orchestrator substitutes the token store's canonical copy.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    success: bool,
    response: Option<Value>,
    redirect: Option<String>,
    errors: OutcomeMessages,
    messages: OutcomeMessages,
    token: Option<AuthToken>,
}

impl AuthOutcome {
    /// Create an outcome with the given success flag and nothing else.
    #[must_use]
    pub const fn new(success: bool) -> Self {
        Self {
            success,
            response: None,
            redirect: None,
            errors: OutcomeMessages::new(),
            messages: OutcomeMessages::new(),
            token: None,
        }
    }

    /// Shorthand for a successful outcome.
    #[must_use]
    pub const fn succeeded() -> Self {
        Self::new(true)
    }

    /// Shorthand for a failed outcome.
    #[must_use]
    pub const fn failed() -> Self {
        Self::new(false)
    }

    /// Attach the provider-specific response payload.
    #[must_use]
    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Attach a redirect hint.
    #[must_use]
    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    /// Attach an optional redirect hint.
    #[must_use]
    pub fn with_redirect_opt(mut self, redirect: Option<String>) -> Self {
        self.redirect = redirect;
        self
    }

    /// Set the error list.
    #[must_use]
    pub fn with_errors(mut self, errors: impl Into<OutcomeMessages>) -> Self {
        self.errors = errors.into();
        self
    }

    /// Set the message list.
    #[must_use]
    pub fn with_messages(mut self, messages: impl Into<OutcomeMessages>) -> Self {
        self.messages = messages.into();
        self
    }

    /// Attach a token.
    #[must_use]
    pub fn with_token(mut self, token: AuthToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Returns true if the operation succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Returns true if the operation failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.success
    }

    /// Provider-specific response, opaque to the orchestrator.
    #[must_use]
    pub const fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }

    /// Redirect hint; never interpreted, only forwarded.
    #[must_use]
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// Non-empty errors, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<&str> {
        self.errors.non_empty().collect()
    }

    /// Non-empty messages, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.messages.non_empty().collect()
    }

    /// The token carried by this outcome, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    /// Returns true if a token with a non-empty value is attached.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.as_ref().is_some_and(AuthToken::is_present)
    }

    /// Swap in a different token, returning the previous one.
    pub fn replace_token(&mut self, token: Option<AuthToken>) -> Option<AuthToken> {
        std::mem::replace(&mut self.token, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_error_normalizes_to_list() {
        let outcome = AuthOutcome::failed().with_errors("Invalid credentials");
        assert_eq!(outcome.errors(), vec!["Invalid credentials"]);
    }

    #[test]
    fn test_empty_entries_are_filtered_on_read() {
        let outcome = AuthOutcome::failed().with_errors(vec!["first", "", "third"]);
        assert_eq!(outcome.errors(), vec!["first", "third"]);
        assert_eq!(outcome.errors.0.len(), 3);
    }

    #[test]
    fn test_absent_inputs_yield_empty_lists() {
        let outcome = AuthOutcome::succeeded()
            .with_errors(None::<String>)
            .with_messages(());
        assert!(outcome.errors().is_empty());
        assert!(outcome.messages().is_empty());

        let outcome = AuthOutcome::succeeded().with_messages("");
        assert!(outcome.messages().is_empty());
    }

    #[test]
    fn test_success_and_failure_are_complementary() {
        for success in [true, false] {
            let outcome = AuthOutcome::new(success);
            assert_ne!(outcome.is_success(), outcome.is_failure());
            assert_eq!(outcome.is_success(), success);
        }
    }

    #[test]
    fn test_success_without_token() {
        let outcome = AuthOutcome::succeeded()
            .with_messages(["Reset password instructions have been sent to your email."])
            .with_redirect("/auth/reset-password");
        assert!(outcome.is_success());
        assert!(outcome.token().is_none());
        assert!(!outcome.has_token());
        assert_eq!(outcome.redirect(), Some("/auth/reset-password"));
    }

    #[test]
    fn test_replace_token_returns_previous() {
        let mut outcome = AuthOutcome::succeeded().with_token(AuthToken::new("raw"));
        let canonical = AuthToken::new("canonical").with_owner("email");

        let previous = outcome.replace_token(Some(canonical.clone()));
        assert_eq!(previous.map(|t| t.value), Some("raw".to_string()));
        assert_eq!(outcome.token(), Some(&canonical));
    }

    #[test]
    fn test_empty_token_is_not_a_token() {
        let outcome = AuthOutcome::succeeded().with_token(AuthToken::new(""));
        assert!(outcome.token().is_some());
        assert!(!outcome.has_token());
    }
}
