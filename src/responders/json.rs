//! JSON envelopes and the error dispatch table.

use super::Response;
use crate::config::ResponderConfig;
use crate::error::{AuthenticationError, ErrorKind, ResourceError};
use http::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

/// Message of the generic error that replaces unexpected errors outside development.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong when processing the request";

/// Selects the errors a dispatch rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMatcher {
    /// Errors of this kind or one of its subtypes.
    Kind(ErrorKind),
    Any,
}

impl ErrorMatcher {
    pub fn matches(&self, error: &ResourceError) -> bool {
        match self {
            ErrorMatcher::Kind(kind) => error.kind().is_a(*kind),
            ErrorMatcher::Any => true,
        }
    }
}

/// Which error a matched rule puts in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRender {
    /// The error itself.
    Error,
    /// A generic authentication failure, except in development.
    AuthenticationFailed,
    /// A generic error, except in development.
    Generic,
}

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonRule {
    pub matcher: ErrorMatcher,
    pub status: StatusCode,
    pub render: ErrorRender,
}

impl JsonRule {
    pub const fn new(matcher: ErrorMatcher, status: StatusCode, render: ErrorRender) -> Self {
        Self {
            matcher,
            status,
            render,
        }
    }
}

/// The default dispatch table, in precedence order.
pub fn default_rules() -> Vec<JsonRule> {
    use ErrorMatcher::{Any, Kind};
    vec![
        JsonRule::new(
            Kind(ErrorKind::FailedValidation),
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorRender::Error,
        ),
        JsonRule::new(Kind(ErrorKind::NotFound), StatusCode::NOT_FOUND, ErrorRender::Error),
        JsonRule::new(Kind(ErrorKind::NotUnique), StatusCode::NOT_FOUND, ErrorRender::Error),
        JsonRule::new(
            Kind(ErrorKind::InvalidParameters),
            StatusCode::BAD_REQUEST,
            ErrorRender::Error,
        ),
        JsonRule::new(
            Kind(ErrorKind::Authentication),
            StatusCode::UNAUTHORIZED,
            ErrorRender::AuthenticationFailed,
        ),
        JsonRule::new(Any, StatusCode::INTERNAL_SERVER_ERROR, ErrorRender::Generic),
    ]
}

/// Status the default table assigns to `error`.
pub fn status_for(error: &ResourceError) -> StatusCode {
    default_rules()
        .iter()
        .find(|rule| rule.matcher.matches(error))
        .map(|rule| rule.status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Renders outcomes as `{ok, data}` / `{ok, error}` envelopes.
#[derive(Debug, Clone)]
pub struct JsonResponder {
    config: ResponderConfig,
    rules: Vec<JsonRule>,
}

impl JsonResponder {
    pub fn new(config: ResponderConfig) -> Self {
        Self {
            config,
            rules: default_rules(),
        }
    }

    /// Adds a rule checked before every existing rule.
    pub fn with_rule(mut self, rule: JsonRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn rules(&self) -> &[JsonRule] {
        &self.rules
    }

    pub fn success(&self, data: Value, status: StatusCode) -> Response {
        Response::Json {
            status,
            body: json!({ "ok": true, "data": data }),
        }
    }

    /// Renders the first rule matching `error`.
    pub fn failure(&self, error: &ResourceError) -> Response {
        let (status, rendered) = self.public_error(error);
        Response::Json {
            status,
            body: json!({ "ok": false, "error": rendered.as_json() }),
        }
    }

    /// Status of the first rule matching `error`, and the error that may be shown
    /// to the client under the current environment.
    pub fn public_error(&self, error: &ResourceError) -> (StatusCode, ResourceError) {
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.matcher.matches(error))
            .copied()
            .unwrap_or(JsonRule::new(
                ErrorMatcher::Any,
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorRender::Generic,
            ));
        debug!(kind = ?error.kind(), status = %rule.status, "Matched error rule");
        (rule.status, self.render_error(error, rule.render))
    }

    fn render_error(&self, error: &ResourceError, render: ErrorRender) -> ResourceError {
        let development = self.config.environment.is_development();
        match render {
            ErrorRender::Error => error.clone(),
            _ if development => error.clone(),
            ErrorRender::AuthenticationFailed => AuthenticationError::Failed.into(),
            ErrorRender::Generic => ResourceError::generic(GENERIC_ERROR_MESSAGE),
        }
    }
}
