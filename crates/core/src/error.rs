//! Document layer error types.

use blobdoc_shared::AppError;
use thiserror::Error;

use crate::storage::StorageError;

/// Document operation errors.
///
/// A dangling index, a missing index and a missing primary object all surface
/// as [`DocumentError::NotFound`]; callers cannot tell them apart.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Primary object or index entry absent.
    #[error("not found: {bucket}/{key}")]
    NotFound {
        /// Bucket that was read.
        bucket: String,
        /// Key that was not found.
        key: String,
    },

    /// Unique value already taken when it was checked.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Payload present but undecodable.
    #[error("corrupt object {bucket}/{key}: {source}")]
    CorruptObject {
        /// Bucket holding the object.
        bucket: String,
        /// Key of the object.
        key: String,
        /// Decoder error.
        source: serde_json::Error,
    },

    /// Entity could not be serialized.
    #[error("failed to encode {bucket}/{key}: {source}")]
    Encode {
        /// Bucket the object was meant for.
        bucket: String,
        /// Key the object was meant for.
        key: String,
        /// Encoder error.
        source: serde_json::Error,
    },

    /// Transport or backend failure from the object store.
    #[error("store unavailable during {operation} on {bucket}/{key}: {message}")]
    StoreUnavailable {
        /// Bucket the call targeted.
        bucket: String,
        /// Key the call targeted.
        key: String,
        /// Store operation name.
        operation: &'static str,
        /// Backend error message.
        message: String,
    },

    /// The caller's context was cancelled or timed out.
    #[error("{operation} cancelled")]
    Cancelled {
        /// Store operation that was interrupted.
        operation: &'static str,
    },
}

impl DocumentError {
    /// Create a conflict error for a unique field.
    #[must_use]
    pub fn already_exists(field: &str) -> Self {
        Self::Conflict(format!("{field} already exists"))
    }

    /// Returns `true` for [`DocumentError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`DocumentError::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<StorageError> for DocumentError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { bucket, key } => Self::NotFound { bucket, key },
            StorageError::Unavailable {
                bucket,
                key,
                operation,
                message,
            } => Self::StoreUnavailable {
                bucket,
                key,
                operation,
                message,
            },
            StorageError::UnknownBucket(bucket) => Self::StoreUnavailable {
                message: format!("unknown bucket: {bucket}"),
                bucket,
                key: String::new(),
                operation: "resolve bucket",
            },
            StorageError::Configuration(message) => Self::StoreUnavailable {
                bucket: String::new(),
                key: String::new(),
                operation: "configure",
                message,
            },
            StorageError::Cancelled { operation } => Self::Cancelled { operation },
        }
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound { .. } => Self::NotFound(err.to_string()),
            DocumentError::Conflict(msg) => Self::Conflict(msg),
            DocumentError::StoreUnavailable { .. } | DocumentError::Cancelled { .. } => {
                Self::Storage(err.to_string())
            }
            DocumentError::CorruptObject { .. } | DocumentError::Encode { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}
