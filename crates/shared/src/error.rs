//! Application-wide error types.
//!
//! Request handlers see only this taxonomy. Document store failures collapse
//! into it, so a dangling index, a missing index and a missing entity are all
//! reported as [`AppError::NotFound`].

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Entity absent, or unreachable through a lookup.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique value already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The object store failed or the call was cut short.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored data could not be read or written as an entity.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Response body for this error. Server-side details are not exposed.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let message = match self {
            Self::NotFound(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Storage(_) | Self::Internal(_) => "internal server error".to_string(),
        };
        ErrorBody {
            error: self.error_code(),
            message,
        }
    }
}

/// JSON error body, `{"error": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Value of [`AppError::error_code`].
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
}
