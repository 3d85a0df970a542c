//! Storage error types.

use thiserror::Error;

/// Object store client errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("object not found: {bucket}/{key}")]
    NotFound {
        /// Bucket that was read.
        bucket: String,
        /// Storage key that was not found.
        key: String,
    },

    /// Transport or backend failure.
    #[error("storage {operation} failed for {bucket}/{key}: {message}")]
    Unavailable {
        /// Bucket the call targeted.
        bucket: String,
        /// Key (or listing prefix) the call targeted.
        key: String,
        /// Store operation name.
        operation: &'static str,
        /// Backend error message.
        message: String,
    },

    /// Bucket is not configured on this store.
    #[error("unknown bucket: {0}")]
    UnknownBucket(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// The caller's context was cancelled or timed out.
    #[error("storage {operation} cancelled")]
    Cancelled {
        /// Store operation name.
        operation: &'static str,
    },
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(
        bucket: impl Into<String>,
        key: impl Into<String>,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Unavailable {
            bucket: bucket.into(),
            key: key.into(),
            operation,
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a cancelled error.
    #[must_use]
    pub const fn cancelled(operation: &'static str) -> Self {
        Self::Cancelled { operation }
    }

    /// Maps an OpenDAL error, attaching the bucket, key and operation.
    #[must_use]
    pub fn from_opendal(
        err: &opendal::Error,
        bucket: &str,
        key: &str,
        operation: &'static str,
    ) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(bucket, key),
            _ => Self::unavailable(bucket, key, operation, err.to_string()),
        }
    }

    /// Returns `true` for [`StorageError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
