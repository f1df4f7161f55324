//! Repository error types
//!
//! Collaborators report failures as a [`RepositoryError`]: what was being done,
//! which category of failure it was, and the resource involved. The pipeline
//! recognizes the category; everything it does not recognize is an internal
//! error whose text only reaches the log.
//!
//! ```rust
//! use tasktrack::pipeline::ErrorKind;
//! use tasktrack::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::already_exists("user", "email");
//! assert_eq!(error.kind, RepositoryErrorKind::AlreadyExists);
//!
//! let api: tasktrack::pipeline::ApiError = error.into();
//! assert_eq!(api.kind(), ErrorKind::DataConflict);
//! ```

use std::fmt;

use crate::pipeline::ApiError;

/// Operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    Create,
    FindById,
    FindByEmail,
    ListByOwner,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::FindById => write!(f, "find_by_id"),
            Self::FindByEmail => write!(f, "find_by_email"),
            Self::ListByOwner => write!(f, "list_by_owner"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Entity was not found where one was required
    NotFound,
    /// Unique field already taken
    AlreadyExists,
    /// Backend unreachable
    ConnectionFailed,
    /// Backend did not answer in time
    Timeout,
    /// Anything else
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    pub operation: RepositoryOperation,
    pub kind: RepositoryErrorKind,
    pub message: String,
    /// Resource involved, e.g. `user`
    pub resource: Option<String>,
    /// Field involved in a uniqueness violation, e.g. `email`
    pub field: Option<String>,
}

impl RepositoryError {
    pub fn new(operation: RepositoryOperation, kind: RepositoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            resource: None,
            field: None,
        }
    }

    /// Required entity is missing
    pub fn not_found(operation: RepositoryOperation, resource: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..Self::new(operation, RepositoryErrorKind::NotFound, "Entity not found")
        }
    }

    /// Unique `field` of `resource` is already taken
    pub fn already_exists(resource: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            field: Some(field.into()),
            ..Self::new(
                RepositoryOperation::Create,
                RepositoryErrorKind::AlreadyExists,
                "Entity already exists",
            )
        }
    }

    pub fn connection_failed(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::ConnectionFailed, message)
    }

    pub fn timeout(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Timeout, message)
    }

    /// Transient errors that may succeed on a later request
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(resource) = &self.resource {
            write!(f, " [{}", resource)?;
            if let Some(field) = &self.field {
                write!(f, ".{}", field)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match (err.kind, &err.resource, &err.field) {
            (RepositoryErrorKind::AlreadyExists, Some(resource), Some(field)) => {
                ApiError::conflict(resource.as_str(), field.as_str())
            }
            (RepositoryErrorKind::NotFound, Some(resource), _) => ApiError::not_found(resource.as_str()),
            _ => ApiError::internal(err),
        }
    }
}
