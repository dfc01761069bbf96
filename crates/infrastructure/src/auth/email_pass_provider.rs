//! Email/password provider backed by an HTTP API.
//!
//! Each operation posts the caller's payload as JSON to its own endpoint and
//! turns the reply into an [`AuthOutcome`]:
//! - 2xx replies become successful outcomes carrying the server's messages
//!   and, for login/register, the token found at `token_key`
//! - any other status becomes a failed outcome carrying the server's errors
//!
//! Connection failures are not outcomes; they surface as [`ProviderError`].

use std::fmt;

use async_trait::async_trait;
use authgate_application::{AuthProvider, ProviderError};
use authgate_domain::{AuthOutcome, AuthPayload, AuthToken, RedirectHints};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

const GENERIC_ERROR: &str = "Something went wrong, please try again.";

/// HTTP verb used by one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    #[serde(alias = "get")]
    Get,
    /// POST
    #[serde(alias = "post")]
    Post,
    /// PUT
    #[serde(alias = "put")]
    Put,
    /// PATCH
    #[serde(alias = "patch")]
    Patch,
    /// DELETE
    #[serde(alias = "delete")]
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// Settings of a single operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OperationConfig {
    /// Absolute URL, or a path joined onto `base_url`. `None` disables the operation.
    pub endpoint: Option<String>,
    /// HTTP verb; each operation has its own default.
    pub method: Option<HttpMethod>,
    /// Redirect hints copied into outcomes.
    pub redirect: RedirectHints,
    /// Errors reported when a failed reply carries none.
    pub default_errors: Option<Vec<String>>,
    /// Messages reported when a successful reply carries none.
    pub default_messages: Option<Vec<String>>,
}

impl OperationConfig {
    /// Operation enabled at `endpoint` with default settings.
    #[must_use]
    pub fn at(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    /// Set the redirect hints.
    #[must_use]
    pub fn with_redirect(mut self, redirect: RedirectHints) -> Self {
        self.redirect = redirect;
        self
    }
}

/// Settings for [`EmailPassAuthProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmailPassConfig {
    /// Base URL relative endpoints are resolved against.
    pub base_url: Option<String>,
    /// Dot path of the token in a login/register reply.
    pub token_key: String,
    /// Dot path of the error list in a failed reply.
    pub errors_key: String,
    /// Dot path of the message list in a successful reply.
    pub messages_key: String,
    /// Login.
    pub login: OperationConfig,
    /// Registration.
    pub register: OperationConfig,
    /// Logout.
    pub logout: OperationConfig,
    /// Password reset request.
    pub request_pass: OperationConfig,
    /// Password reset.
    pub reset_pass: OperationConfig,
}

impl Default for EmailPassConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token_key: "data.token".to_string(),
            errors_key: "data.errors".to_string(),
            messages_key: "data.messages".to_string(),
            login: OperationConfig::default(),
            register: OperationConfig::default(),
            logout: OperationConfig::default(),
            request_pass: OperationConfig::default(),
            reset_pass: OperationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Login,
    Register,
    Logout,
    RequestPass,
    ResetPass,
}

impl Operation {
    const fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Logout => "logout",
            Self::RequestPass => "request_pass",
            Self::ResetPass => "reset_pass",
        }
    }

    const fn default_method(self) -> HttpMethod {
        match self {
            Self::Login | Self::Register | Self::RequestPass => HttpMethod::Post,
            Self::Logout => HttpMethod::Delete,
            Self::ResetPass => HttpMethod::Put,
        }
    }

    const fn default_error(self) -> &'static str {
        match self {
            Self::Login => "Login/Email combination is not correct, please try again.",
            _ => GENERIC_ERROR,
        }
    }

    const fn default_message(self) -> &'static str {
        match self {
            Self::Login => "You have been successfully logged in.",
            Self::Register => "You have been successfully registered.",
            Self::Logout => "You have been successfully logged out.",
            Self::RequestPass => "Reset password instructions have been sent to your email.",
            Self::ResetPass => "Your password has been successfully changed.",
        }
    }

    const fn issues_token(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operation with its endpoint resolved.
#[derive(Debug, Clone)]
struct Route {
    url: Url,
    method: HttpMethod,
    redirect: RedirectHints,
    errors: Vec<String>,
    messages: Vec<String>,
}

impl Route {
    /// Resolve `settings` for `op`; `None` when the operation is disabled.
    fn resolve(
        base: Option<&Url>,
        op: Operation,
        settings: &OperationConfig,
    ) -> Result<Option<Self>, ProviderError> {
        let Some(endpoint) = settings.endpoint.as_deref() else {
            return Ok(None);
        };
        Ok(Some(Self {
            url: resolve_endpoint(base, op, endpoint)?,
            method: settings.method.unwrap_or_else(|| op.default_method()),
            redirect: settings.redirect.clone(),
            errors: settings
                .default_errors
                .clone()
                .unwrap_or_else(|| vec![op.default_error().to_string()]),
            messages: settings
                .default_messages
                .clone()
                .unwrap_or_else(|| vec![op.default_message().to_string()]),
        }))
    }
}

/// Resolved routes, one slot per operation.
#[derive(Debug, Clone)]
struct Routes {
    login: Option<Route>,
    register: Option<Route>,
    logout: Option<Route>,
    request_pass: Option<Route>,
    reset_pass: Option<Route>,
}

impl Routes {
    fn resolve(base: Option<&Url>, config: &EmailPassConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            login: Route::resolve(base, Operation::Login, &config.login)?,
            register: Route::resolve(base, Operation::Register, &config.register)?,
            logout: Route::resolve(base, Operation::Logout, &config.logout)?,
            request_pass: Route::resolve(base, Operation::RequestPass, &config.request_pass)?,
            reset_pass: Route::resolve(base, Operation::ResetPass, &config.reset_pass)?,
        })
    }

    const fn get(&self, op: Operation) -> Option<&Route> {
        match op {
            Operation::Login => self.login.as_ref(),
            Operation::Register => self.register.as_ref(),
            Operation::Logout => self.logout.as_ref(),
            Operation::RequestPass => self.request_pass.as_ref(),
            Operation::ResetPass => self.reset_pass.as_ref(),
        }
    }
}

/// Provider talking to an email/password HTTP API.
#[derive(Debug, Clone)]
pub struct EmailPassAuthProvider {
    http_client: reqwest::Client,
    token_key: String,
    errors_key: String,
    messages_key: String,
    routes: Routes,
}

impl EmailPassAuthProvider {
    /// Create a provider, resolving every configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the base URL or an endpoint
    /// cannot be parsed, or a relative endpoint has no base URL to join.
    pub fn new(config: EmailPassConfig) -> Result<Self, ProviderError> {
        let base = config
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| {
                    ProviderError::Configuration(format!("invalid base_url '{raw}': {e}"))
                })
            })
            .transpose()?;

        let routes = Routes::resolve(base.as_ref(), &config)?;

        Ok(Self {
            http_client: reqwest::Client::builder()
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            token_key: config.token_key,
            errors_key: config.errors_key,
            messages_key: config.messages_key,
            routes,
        })
    }

    /// Resolved URL of an operation, if enabled.
    fn route(&self, op: Operation) -> Result<&Route, ProviderError> {
        self.routes.get(op).ok_or_else(|| {
            ProviderError::Configuration(format!("operation '{op}' has no endpoint configured"))
        })
    }

    async fn call(
        &self,
        op: Operation,
        payload: Option<&AuthPayload>,
    ) -> Result<AuthOutcome, ProviderError> {
        let route = self.route(op)?;
        debug!(operation = %op, url = %route.url, method = ?route.method, "Sending auth request");

        let mut request = self
            .http_client
            .request(route.method.into(), route.url.clone());
        if let Some(payload) = payload {
            request = request.json(payload.as_value());
        }

        let response = request
            .send()
            .await
            .map_err(|e: reqwest::Error| ProviderError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e: reqwest::Error| ProviderError::Transport(e.to_string()))?;

        if status.is_success() {
            let value = if body.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&body).map_err(|e| {
                    ProviderError::InvalidResponse(format!("{op} reply is not JSON: {e}"))
                })?
            };
            Ok(self.success_outcome(op, route, value))
        } else {
            warn!(operation = %op, status = %status, "Auth request rejected");
            let value = serde_json::from_slice::<Value>(&body).ok();
            Ok(self.failure_outcome(route, value))
        }
    }

    fn success_outcome(&self, op: Operation, route: &Route, value: Value) -> AuthOutcome {
        let messages = string_list(&value, &self.messages_key).unwrap_or_else(|| route.messages.clone());
        let token = op
            .issues_token()
            .then(|| lookup(&value, &self.token_key).and_then(Value::as_str))
            .flatten()
            .map(AuthToken::new);

        let outcome = AuthOutcome::succeeded()
            .with_redirect_opt(route.redirect.success.clone())
            .with_messages(messages)
            .with_response(value);
        match token {
            Some(token) => outcome.with_token(token),
            None => outcome,
        }
    }

    fn failure_outcome(&self, route: &Route, value: Option<Value>) -> AuthOutcome {
        let errors = value
            .as_ref()
            .and_then(|v| string_list(v, &self.errors_key))
            .unwrap_or_else(|| route.errors.clone());

        let outcome = AuthOutcome::failed()
            .with_redirect_opt(route.redirect.failure.clone())
            .with_errors(errors);
        match value {
            Some(value) => outcome.with_response(value),
            None => outcome,
        }
    }
}

fn resolve_endpoint(base: Option<&Url>, op: Operation, endpoint: &str) -> Result<Url, ProviderError> {
    match Url::parse(endpoint) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| {
                ProviderError::Configuration(format!(
                    "{op} endpoint '{endpoint}' is relative but no base_url is set"
                ))
            })?;
            base.join(endpoint).map_err(|e| {
                ProviderError::Configuration(format!("invalid {op} endpoint '{endpoint}': {e}"))
            })
        }
        Err(e) => Err(ProviderError::Configuration(format!(
            "invalid {op} endpoint '{endpoint}': {e}"
        ))),
    }
}

/// Follow a dot-separated path through objects and arrays.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// A string or a list of strings found at `path`.
fn string_list(value: &Value, path: &str) -> Option<Vec<String>> {
    match lookup(value, path)? {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
        ),
        _ => None,
    }
}

#[async_trait]
impl AuthProvider for EmailPassAuthProvider {
    async fn authenticate(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
        self.call(Operation::Login, Some(payload)).await
    }

    async fn register(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
        self.call(Operation::Register, Some(payload)).await
    }

    async fn logout(&self) -> Result<AuthOutcome, ProviderError> {
        self.call(Operation::Logout, None).await
    }

    async fn request_password(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
        self.call(Operation::RequestPass, Some(payload)).await
    }

    async fn reset_password(&self, payload: &AuthPayload) -> Result<AuthOutcome, ProviderError> {
        self.call(Operation::ResetPass, Some(payload)).await
    }
}
