//! Domain error model for the request pipeline
//!
//! Handlers, middlewares and services fail with an [`ApiError`]. Each variant
//! carries the payload needed to build its wire bodies (a resource name, a
//! field name, or a list of field-level problems). The dispatcher is the only
//! place that turns an `ApiError` into a status code and a JSON body.
//!
//! # Example
//!
//! ```rust
//! use tasktrack::pipeline::{ApiError, ErrorKind};
//!
//! let error = ApiError::conflict("user", "email");
//! assert_eq!(error.kind(), ErrorKind::DataConflict);
//! assert_eq!(error.status_code().as_u16(), 409);
//! assert_eq!(error.bodies()[0].target, "email");
//! ```

use std::fmt;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure causes, independent of transport status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid credential
    Unauthorized,
    /// Named resource absent
    ResourceNotFound,
    /// Uniqueness violation on a named resource/field
    DataConflict,
    /// Credential check failed
    PasswordMismatch,
    /// One or more field-level problems
    ValidationFailed,
    /// Unclassified failure
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::ResourceNotFound => write!(f, "resource_not_found"),
            Self::DataConflict => write!(f, "data_conflict"),
            Self::PasswordMismatch => write!(f, "password_mismatch"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Kind to wire status. Extend by adding a row.
const KIND_STATUS: &[(ErrorKind, StatusCode)] = &[
    (ErrorKind::ValidationFailed, StatusCode::BAD_REQUEST),
    (ErrorKind::Unauthorized, StatusCode::FORBIDDEN),
    (ErrorKind::PasswordMismatch, StatusCode::FORBIDDEN),
    (ErrorKind::ResourceNotFound, StatusCode::NOT_FOUND),
    (ErrorKind::DataConflict, StatusCode::CONFLICT),
    (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
];

impl ErrorKind {
    /// HTTP status this kind is reported with
    #[must_use]
    pub fn status_code(self) -> StatusCode {
        KIND_STATUS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or(StatusCode::INTERNAL_SERVER_ERROR, |(_, status)| *status)
    }
}

/// One problem reported to the caller
///
/// Empty fields are omitted on the wire, so a generic body serializes as
/// `{"message": "Access denied"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Offending field or resource, empty for generic bodies
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
}

impl ErrorBody {
    /// Body pointing at a specific field
    pub fn new(message: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            target: target.into(),
        }
    }

    /// Body without a target
    pub fn generic(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            target: String::new(),
        }
    }
}

/// Error returned by handlers, middlewares and services
///
/// The `Display` text is the top-level message. It goes to the log line only;
/// callers see [`ApiError::bodies`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Missing or invalid credential
    #[error("unauthorized")]
    Unauthorized,

    /// Named resource does not exist
    #[error("{resource} not found")]
    ResourceNotFound {
        /// Resource name, e.g. `task`
        resource: String,
    },

    /// Unique field already taken
    #[error("Conflicting data for {field} field in {resource} resource")]
    DataConflict {
        /// Resource name, e.g. `user`
        resource: String,
        /// Conflicting field, e.g. `email`
        field: String,
    },

    /// Credentials did not match
    #[error("password mismatch")]
    PasswordMismatch,

    /// One or more field-level problems
    #[error("{message}")]
    ValidationFailed {
        /// Top-level summary
        message: String,
        /// One body per offending field
        bodies: Vec<ErrorBody>,
    },

    /// Anything else; the text never reaches the caller
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Resource lookup came back empty
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource: resource.into(),
        }
    }

    /// Unique constraint violated on `resource.field`
    pub fn conflict(resource: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DataConflict {
            resource: resource.into(),
            field: field.into(),
        }
    }

    /// Validation failure with a single targeted body
    pub fn invalid(
        message: impl Into<String>,
        body_message: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::ValidationFailed {
            message: message.into(),
            bodies: vec![ErrorBody::new(body_message, target)],
        }
    }

    /// Request body could not be decoded
    pub fn invalid_request_body() -> Self {
        Self::ValidationFailed {
            message: "Invalid request body".to_string(),
            bodies: vec![ErrorBody::generic("Invalid request body")],
        }
    }

    /// Wrap an opaque collaborator failure
    pub fn internal(err: impl fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    /// Classification of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::DataConflict { .. } => ErrorKind::DataConflict,
            Self::PasswordMismatch => ErrorKind::PasswordMismatch,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status this error is reported with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Wire bodies for this error
    pub fn bodies(&self) -> Vec<ErrorBody> {
        match self {
            Self::Unauthorized => vec![ErrorBody::generic("Access denied")],
            Self::ResourceNotFound { resource } => {
                vec![ErrorBody::new("Resource not found", resource.as_str())]
            }
            Self::DataConflict { field, .. } => vec![ErrorBody::new("Conflicting data", field.as_str())],
            Self::PasswordMismatch => vec![ErrorBody::generic("Invalid email/password")],
            Self::ValidationFailed { bodies, .. } => bodies.clone(),
            Self::Internal(_) => vec![ErrorBody::generic("Internal server error")],
        }
    }
}

/// Collects field problems so that every violation is reported at once
///
/// ```rust
/// use tasktrack::pipeline::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// errors.add("name", "Non-empty value is required");
/// errors.add("password", "Length should be 6 or more");
/// let err = errors.finish("validation error").unwrap_err();
/// assert_eq!(err.bodies().len(), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ValidationErrors {
    bodies: Vec<ErrorBody>,
}

impl ValidationErrors {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem with `target`
    pub fn add(&mut self, target: impl Into<String>, message: impl Into<String>) {
        self.bodies.push(ErrorBody::new(message, target));
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// `Ok` when empty, otherwise a single `ValidationFailed` with every body
    pub fn finish(self, message: impl Into<String>) -> Result<(), ApiError> {
        if self.bodies.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationFailed {
                message: message.into(),
                bodies: self.bodies,
            })
        }
    }
}
