//! Response envelope and the status table
//!
//! Every dispatched response has the shape `{status, data?, errors?}`. The
//! status table decides which statuses may reach the wire and how loudly each
//! one is logged.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, ErrorBody};

/// JSON envelope written for every dispatched request
///
/// Exactly one of `data` / `errors` is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Wire status, repeated in the body
    pub status: u16,

    /// Success payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Failure bodies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorBody>,
}

impl Default for ApiResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            data: None,
            errors: Vec::new(),
        }
    }
}

impl ApiResponse {
    /// Success envelope
    pub fn success(status: StatusCode, data: Value) -> Self {
        Self {
            status: status.as_u16(),
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Failure envelope for `error`
    pub fn failure(error: &ApiError) -> Self {
        Self {
            status: error.status_code().as_u16(),
            data: None,
            errors: error.bodies(),
        }
    }
}

/// What a terminal handler produced on success
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Intended status
    pub status: StatusCode,
    /// Serialized payload
    pub data: Value,
}

impl Reply {
    /// Reply with an explicit status
    ///
    /// Statuses the dispatcher does not know are answered with 500.
    pub fn with_status<T: Serialize>(status: StatusCode, data: &T) -> Result<Self, ApiError> {
        let data = serde_json::to_value(data).map_err(ApiError::internal)?;
        Ok(Self { status, data })
    }

    /// 200 with `data`
    pub fn ok<T: Serialize>(data: &T) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::OK, data)
    }

    /// 201 with `data`
    pub fn created<T: Serialize>(data: &T) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::CREATED, data)
    }
}

/// Log level of the request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// How one wire status is logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRule {
    pub status: StatusCode,
    pub severity: Severity,
    /// Whether the error text is put on the log line
    pub attach_error: bool,
}

const fn rule(status: StatusCode, severity: Severity, attach_error: bool) -> StatusRule {
    StatusRule {
        status,
        severity,
        attach_error,
    }
}

/// Statuses that may reach the wire. Anything else becomes [`FALLBACK_RULE`].
pub const STATUS_RULES: &[StatusRule] = &[
    rule(StatusCode::OK, Severity::Info, false),
    rule(StatusCode::CREATED, Severity::Info, false),
    rule(StatusCode::BAD_REQUEST, Severity::Warn, false),
    rule(StatusCode::FORBIDDEN, Severity::Warn, false),
    rule(StatusCode::NOT_FOUND, Severity::Warn, false),
    rule(StatusCode::CONFLICT, Severity::Warn, true),
];

/// Rule for every status missing from [`STATUS_RULES`]
pub const FALLBACK_RULE: StatusRule = rule(StatusCode::INTERNAL_SERVER_ERROR, Severity::Error, true);

/// Look up `status` in the table
pub fn rule_for(status: StatusCode) -> Option<StatusRule> {
    STATUS_RULES.iter().copied().find(|r| r.status == status)
}
