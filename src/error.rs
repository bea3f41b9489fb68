//! Error types shared by every resource action.
//!
//! Failures are values: each step of an action returns a [`ResourceError`] instead
//! of panicking, and the responders map the error's [`ErrorKind`] onto a status
//! code and a serialised body.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Outcome of a resource operation.
pub type Outcome<T> = Result<T, ResourceError>;

/// Errors that can occur while resolving, validating or persisting a resource.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResourceError {
    /// No entity matched the requested attribute value.
    #[error("{collection} not found with {attribute} {value:?}")]
    NotFound {
        collection: String,
        attribute: String,
        value: String,
    },

    /// More than one entity matched an attribute that should be unique.
    #[error("{collection} not unique with {attribute} {value:?}")]
    NotUnique {
        collection: String,
        attribute: String,
        value: String,
    },

    /// The entity failed validation before it was persisted.
    #[error("{entity_class} failed validation: {errors}")]
    FailedValidation {
        entity_class: String,
        errors: ValidationErrors,
    },

    /// The request parameters were missing or malformed.
    #[error("invalid request parameters: {message}")]
    InvalidParameters { message: String },

    /// The request could not be authenticated.
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// None of the configured slug sources had a value.
    #[error("unable to generate slug: {} blank", .attributes.join(", "))]
    EmptySlugSource { attributes: Vec<String> },

    /// Any other failure.
    #[error("{message}")]
    Generic { message: String },
}

/// Credential or identity failures.
///
/// Every variant is an authentication error; [`AuthenticationError::Failed`] is
/// the generic one shown to clients outside development.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthenticationError {
    #[error("authentication failed")]
    Failed,
    #[error("missing credentials")]
    MissingCredentials,
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("session expired")]
    ExpiredSession,
}

/// Discriminant of a [`ResourceError`], used by dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotUnique,
    FailedValidation,
    InvalidParameters,
    AuthenticationFailed,
    Authentication,
    EmptySlugSource,
    Generic,
}

impl ErrorKind {
    /// Returns true when `self` is `other` or a subtype of it.
    ///
    /// `AuthenticationFailed` is a subtype of `Authentication`; every other kind
    /// only matches itself.
    pub fn is_a(self, other: ErrorKind) -> bool {
        self == other
            || (self == ErrorKind::AuthenticationFailed && other == ErrorKind::Authentication)
    }
}

impl ResourceError {
    pub fn not_found(
        collection: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            collection: collection.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn not_unique(
        collection: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::NotUnique {
            collection: collection.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotUnique { .. } => ErrorKind::NotUnique,
            Self::FailedValidation { .. } => ErrorKind::FailedValidation,
            Self::InvalidParameters { .. } => ErrorKind::InvalidParameters,
            Self::Authentication(AuthenticationError::Failed) => ErrorKind::AuthenticationFailed,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::EmptySlugSource { .. } => ErrorKind::EmptySlugSource,
            Self::Generic { .. } => ErrorKind::Generic,
        }
    }

    /// Stable type identifier sent to JSON clients.
    pub fn type_name(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "resource_engine.errors.not_found",
            ErrorKind::NotUnique => "resource_engine.errors.not_unique",
            ErrorKind::FailedValidation => "resource_engine.errors.failed_validation",
            ErrorKind::InvalidParameters => "resource_engine.errors.invalid_parameters",
            ErrorKind::AuthenticationFailed => "resource_engine.errors.authentication_failed",
            ErrorKind::Authentication => "resource_engine.errors.authentication_error",
            ErrorKind::EmptySlugSource => "resource_engine.errors.empty_slug_source",
            ErrorKind::Generic => "resource_engine.errors.generic",
        }
    }

    /// Structured details for the `data` member of the error envelope.
    pub fn data(&self) -> Value {
        match self {
            Self::NotFound {
                collection,
                attribute,
                value,
            }
            | Self::NotUnique {
                collection,
                attribute,
                value,
            } => json!({
                "collection_name": collection,
                "attribute_name": attribute,
                "attribute_value": value,
            }),
            Self::FailedValidation {
                entity_class,
                errors,
            } => json!({
                "entity_class": entity_class,
                "errors": errors,
            }),
            Self::EmptySlugSource { attributes } => json!({ "attributes": attributes }),
            Self::InvalidParameters { .. } | Self::Authentication(_) | Self::Generic { .. } => {
                json!({})
            }
        }
    }

    /// Serialises the error as `{type, message, data}`.
    pub fn as_json(&self) -> Value {
        json!({
            "type": self.type_name(),
            "message": self.to_string(),
            "data": self.data(),
        })
    }
}

/// A single failed validation on an entity attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub attribute: String,
    pub message: String,
}

/// The collected validation failures of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError {
            attribute: attribute.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Messages recorded for `attribute`.
    pub fn messages_for<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a str> {
        self.0
            .iter()
            .filter(move |error| error.attribute == attribute)
            .map(|error| error.message.as_str())
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self
            .0
            .iter()
            .map(|error| format!("{} {}", error.attribute, error.message))
            .collect();
        write!(f, "{}", messages.join(", "))
    }
}
