//! Response dispatch.
//!
//! [`Responder::dispatch`] turns the [`Outcome`] of an action into a [`Response`]:
//! a JSON envelope for API clients, or a render/redirect directive for HTML
//! clients. Dispatch does no I/O; serving the response is up to the caller.

pub mod html;
pub mod json;

use crate::actions::ActionName;
use crate::config::ResponderConfig;
use crate::error::{Outcome, ResourceError};
use crate::model::Attributes;
use crate::resource::Resource;
use html::{HtmlResponder, RequestContext};
use http::StatusCode;
use json::JsonResponder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Requested response format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Html,
}

/// Error returned when parsing an unsupported format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    /// Accepts format names and MIME types, ignoring MIME parameters.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "json" | "application/json" => Ok(Format::Json),
            "html" | "text/html" => Ok(Format::Html),
            _ => Err(UnknownFormat(value.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Html => f.write_str("html"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Warning,
    Danger,
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderDirective {
    pub component: String,
    pub assigns: Attributes,
    pub flash: Option<Flash>,
    pub layout: Option<String>,
    #[serde(with = "status_code")]
    pub status: StatusCode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectDirective {
    pub path: String,
    pub flash: Option<Flash>,
    /// Redirect to the referring page when known; `path` is the fallback.
    pub back: bool,
    #[serde(with = "status_code")]
    pub status: StatusCode,
}

impl RedirectDirective {
    pub fn to(path: impl Into<String>, flash: Option<Flash>) -> Self {
        Self {
            path: path.into(),
            flash,
            back: false,
            status: StatusCode::FOUND,
        }
    }

    pub fn back(fallback: impl Into<String>, flash: Option<Flash>) -> Self {
        Self {
            back: true,
            ..Self::to(fallback, flash)
        }
    }
}

/// The result of dispatching an outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    Json {
        #[serde(with = "status_code")]
        status: StatusCode,
        body: Value,
    },
    Render(RenderDirective),
    Redirect(RedirectDirective),
}

impl Response {
    pub fn status(&self) -> StatusCode {
        match self {
            Response::Json { status, .. } => *status,
            Response::Render(directive) => directive.status,
            Response::Redirect(directive) => directive.status,
        }
    }
}

/// Dispatches outcomes of one resource's actions.
#[derive(Debug, Clone)]
pub struct Responder {
    json: JsonResponder,
    html: HtmlResponder,
}

impl Responder {
    pub fn new(resource: Resource, config: ResponderConfig) -> Self {
        Self {
            json: JsonResponder::new(config.clone()),
            html: HtmlResponder::new(resource, config),
        }
    }

    pub fn json(&self) -> &JsonResponder {
        &self.json
    }

    pub fn html(&self) -> &HtmlResponder {
        &self.html
    }

    /// Replaces the JSON error table. HTML error pages take their status from
    /// the same table.
    pub fn with_json(mut self, json: JsonResponder) -> Self {
        self.html = self.html.with_errors(json.clone());
        self.json = json;
        self
    }

    /// Replaces the HTML rules. Error pages keep using the JSON error table.
    pub fn with_html(mut self, html: HtmlResponder) -> Self {
        self.html = html.with_errors(self.json.clone());
        self
    }

    pub fn dispatch<T: Serialize>(
        &self,
        action: ActionName,
        format: Format,
        outcome: Outcome<T>,
    ) -> Response {
        self.dispatch_with_context(action, format, RequestContext::default(), outcome)
    }

    /// Like [`dispatch`](Self::dispatch), for a request naming a member by
    /// `identifier`; failure redirects then point back at that member.
    pub fn dispatch_member<T: Serialize>(
        &self,
        action: ActionName,
        format: Format,
        identifier: Option<&str>,
        outcome: Outcome<T>,
    ) -> Response {
        let context = RequestContext {
            identifier,
            submitted: None,
        };
        self.dispatch_with_context(action, format, context, outcome)
    }

    /// Dispatches the outcome of a request made with `params`.
    pub fn dispatch_request<T: Serialize>(
        &self,
        action: ActionName,
        format: Format,
        params: &Attributes,
        outcome: Outcome<T>,
    ) -> Response {
        let context = RequestContext::from_params(self.html.resource(), action, params);
        self.dispatch_with_context(action, format, context, outcome)
    }

    pub fn dispatch_with_context<T: Serialize>(
        &self,
        action: ActionName,
        format: Format,
        context: RequestContext<'_>,
        outcome: Outcome<T>,
    ) -> Response {
        let outcome = outcome.and_then(|value| {
            serde_json::to_value(value).map_err(|err| {
                ResourceError::generic(format!("failed to serialize {action} result: {err}"))
            })
        });

        let response = match (format, outcome) {
            (Format::Json, Ok(value)) => self.json.success(value, action.success_status()),
            (Format::Json, Err(error)) => self.json.failure(&error),
            (Format::Html, Ok(value)) => self.html.success(action, value),
            (Format::Html, Err(error)) => self.html.failure(action, context, &error),
        };
        debug!(%action, %format, status = %response.status(), "Dispatched outcome");
        response
    }
}

mod status_code {
    use http::StatusCode;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        status: &StatusCode,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(status.as_u16())
    }
}
