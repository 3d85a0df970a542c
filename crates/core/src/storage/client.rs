//! The object store contract consumed by the document layer.

use std::future::Future;

use bytes::Bytes;
use futures::stream::BoxStream;

use super::error::StorageError;

/// Opaque token returned by a successful write (ETag or backend version).
///
/// The document layer never compares versions; there is no conditional write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectVersion(pub Option<String>);

/// Metadata about a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object size in bytes.
    pub size: u64,
    /// Content type recorded at write time.
    pub content_type: Option<String>,
}

/// Flat bucket/key object store.
///
/// `list` yields keys under `prefix` in ascending lexicographic order, one pass,
/// lazily. `delete` succeeds when the key is already absent.
pub trait ObjectStore: Send + Sync {
    /// Write `body` at `key`, replacing any previous object.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> impl Future<Output = Result<ObjectVersion, StorageError>> + Send;

    /// Read the object at `key`.
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<Bytes, StorageError>> + Send;

    /// Read size and content type of the object at `key`.
    fn stat(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<ObjectInfo, StorageError>> + Send;

    /// List keys starting with `prefix`.
    fn list<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxStream<'a, Result<String, StorageError>>;

    /// Delete the object at `key`.
    fn delete(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Check that `bucket` is reachable.
    fn probe(&self, bucket: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}
