//! Secondary indexes emulated with pointer objects.
//!
//! An index entry is a small JSON object `{"primaryId": ...}` stored under a key
//! derived from the indexed value. The store has no conditional write, so
//! uniqueness is check-then-act: two callers can both see a value as free and
//! both write its pointer, and the later write wins. Nothing here closes that
//! window.
//!
//! Index entries are not removed when their entity is deleted unless the caller
//! opts into reverse indexes ([`IndexManager::record_owned`] and
//! [`IndexManager::release_owned`]).

pub mod keys;

use tracing::{debug, warn};

use crate::codec::{self, JSON_CONTENT_TYPE};
use crate::context::CallContext;
use crate::error::DocumentError;
use crate::model::{IndexEntry, ReverseIndex};
use crate::storage::ObjectStore;

pub use keys::Dimension;

/// Creates, resolves and deletes index entries in one store.
#[derive(Debug)]
pub struct IndexManager<'a, S> {
    store: &'a S,
}

impl<'a, S: ObjectStore> IndexManager<'a, S> {
    /// Create an index manager over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Write a pointer to `primary_id` at `key`.
    ///
    /// Succeeds without writing when the key already points to `primary_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Conflict`] if the key points to a different id.
    pub async fn create_index(
        &self,
        ctx: &CallContext,
        bucket: &str,
        key: &str,
        primary_id: &str,
    ) -> Result<(), DocumentError> {
        match self.resolve_index(ctx, bucket, key).await {
            Ok(existing) if existing == primary_id => {
                debug!(bucket, key, primary_id, "index already present");
                return Ok(());
            }
            Ok(existing) => {
                return Err(DocumentError::Conflict(format!(
                    "index {key} already points to {existing}"
                )));
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let entry = IndexEntry {
            primary_id: primary_id.to_string(),
        };
        let body = codec::encode(bucket, key, &entry)?;
        ctx.run("put", self.store.put(bucket, key, body, JSON_CONTENT_TYPE)).await?;
        debug!(bucket, key, primary_id, "index created");
        Ok(())
    }

    /// Read the primary id stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if there is no entry.
    pub async fn resolve_index(
        &self,
        ctx: &CallContext,
        bucket: &str,
        key: &str,
    ) -> Result<String, DocumentError> {
        let bytes = ctx.run("get", self.store.get(bucket, key)).await?;
        let entry: IndexEntry = codec::decode(bucket, key, &bytes)?;
        Ok(entry.primary_id)
    }

    /// Remove the entry at `key`. Succeeds if it is already gone.
    pub async fn delete_index(
        &self,
        ctx: &CallContext,
        bucket: &str,
        key: &str,
    ) -> Result<(), DocumentError> {
        ctx.run("delete", self.store.delete(bucket, key)).await?;
        debug!(bucket, key, "index deleted");
        Ok(())
    }

    /// Write the pointer at `key` if nothing is stored there.
    ///
    /// Returns whether a pointer was written. A pointer to another id is left
    /// alone and reported with a warning.
    ///
    /// # Errors
    ///
    /// Returns any store error other than a missing key.
    pub async fn restore_index(
        &self,
        ctx: &CallContext,
        bucket: &str,
        key: &str,
        primary_id: &str,
    ) -> Result<bool, DocumentError> {
        match self.resolve_index(ctx, bucket, key).await {
            Ok(existing) if existing == primary_id => Ok(false),
            Ok(existing) => {
                warn!(bucket, key, primary_id, %existing, "index held by another entity");
                Ok(false)
            }
            Err(err) if err.is_not_found() => {
                self.create_index(ctx, bucket, key, primary_id).await?;
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    /// Fail with `Conflict("<field> already exists")` if `value` is held by an
    /// entity other than `owner`.
    ///
    /// This is only a check: the value can be taken between this call and the
    /// subsequent [`IndexManager::create_index`].
    pub async fn ensure_available(
        &self,
        ctx: &CallContext,
        bucket: &str,
        dimension: Dimension,
        value: &str,
        owner: Option<&str>,
    ) -> Result<(), DocumentError> {
        let key = keys::unique_key(dimension, value);
        match self.resolve_index(ctx, bucket, &key).await {
            Ok(existing) if Some(existing.as_str()) == owner => Ok(()),
            Ok(_) => Err(DocumentError::already_exists(dimension.as_str())),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Record the index keys `primary_id` owns, replacing any earlier record.
    pub async fn record_owned(
        &self,
        ctx: &CallContext,
        bucket: &str,
        primary_id: &str,
        owned: &[String],
    ) -> Result<(), DocumentError> {
        let key = keys::reverse_key(primary_id);
        let record = ReverseIndex {
            keys: owned.to_vec(),
        };
        let body = codec::encode(bucket, &key, &record)?;
        ctx.run("put", self.store.put(bucket, &key, body, JSON_CONTENT_TYPE)).await?;
        Ok(())
    }

    /// Index keys recorded for `primary_id`; empty when nothing was recorded.
    pub async fn owned_keys(
        &self,
        ctx: &CallContext,
        bucket: &str,
        primary_id: &str,
    ) -> Result<Vec<String>, DocumentError> {
        let key = keys::reverse_key(primary_id);
        match ctx.run("get", self.store.get(bucket, &key)).await {
            Ok(bytes) => Ok(codec::decode::<ReverseIndex>(bucket, &key, &bytes)?.keys),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Delete every index key recorded for `primary_id`, then the record itself.
    ///
    /// Best effort: failures are logged and skipped. Returns how many index keys
    /// were deleted.
    pub async fn release_owned(&self, ctx: &CallContext, bucket: &str, primary_id: &str) -> usize {
        let owned = match self.owned_keys(ctx, bucket, primary_id).await {
            Ok(owned) => owned,
            Err(err) => {
                warn!(bucket, primary_id, error = %err, "could not read owned index keys");
                return 0;
            }
        };

        let mut released = 0;
        for key in &owned {
            match self.delete_index(ctx, bucket, key).await {
                Ok(()) => released += 1,
                Err(err) => warn!(bucket, key, error = %err, "index cleanup failed"),
            }
        }

        let reverse = keys::reverse_key(primary_id);
        if let Err(err) = self.delete_index(ctx, bucket, &reverse).await {
            warn!(bucket, key = %reverse, error = %err, "reverse index cleanup failed");
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> MemoryStore {
        MemoryStore::with_buckets(["users"])
    }

    #[tokio::test]
    async fn test_create_then_resolve() {
        let store = store();
        let index = IndexManager::new(&store);
        let ctx = CallContext::new();

        index
            .create_index(&ctx, "users", "indexes/username-alice.json", "u1")
            .await
            .unwrap();
        let id = index
            .resolve_index(&ctx, "users", "indexes/username-alice.json")
            .await
            .unwrap();
        assert_eq!(id, "u1");
    }

    #[tokio::test]
    async fn test_create_same_id_is_idempotent() {
        let store = store();
        let index = IndexManager::new(&store);
        let ctx = CallContext::new();

        index.create_index(&ctx, "users", "k.json", "u1").await.unwrap();
        index.create_index(&ctx, "users", "k.json", "u1").await.unwrap();
        assert_eq!(store.keys("users", "").len(), 1);
    }

    #[tokio::test]
    async fn test_create_different_id_conflicts() {
        let store = store();
        let index = IndexManager::new(&store);
        let ctx = CallContext::new();

        index.create_index(&ctx, "users", "k.json", "u1").await.unwrap();
        let err = index
            .create_index(&ctx, "users", "k.json", "u2")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Conflict(_)));
        assert_eq!(
            index.resolve_index(&ctx, "users", "k.json").await.unwrap(),
            "u1"
        );
    }

    #[tokio::test]
    async fn test_resolve_missing_is_not_found() {
        let store = store();
        let err = IndexManager::new(&store)
            .resolve_index(&CallContext::new(), "users", "indexes/username-nobody.json")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = store();
        let index = IndexManager::new(&store);
        let ctx = CallContext::new();

        index.create_index(&ctx, "users", "k.json", "u1").await.unwrap();
        index.delete_index(&ctx, "users", "k.json").await.unwrap();
        index.delete_index(&ctx, "users", "k.json").await.unwrap();
        assert!(!store.contains("users", "k.json"));
    }

    #[tokio::test]
    async fn test_ensure_available() {
        let store = store();
        let index = IndexManager::new(&store);
        let ctx = CallContext::new();
        let key = keys::unique_key(Dimension::Email, "a@x.com");
        index.create_index(&ctx, "users", &key, "u1").await.unwrap();

        let err = index
            .ensure_available(&ctx, "users", Dimension::Email, "a@x.com", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "conflict: email already exists");

        index
            .ensure_available(&ctx, "users", Dimension::Email, "a@x.com", Some("u1"))
            .await
            .unwrap();
        index
            .ensure_available(&ctx, "users", Dimension::Email, "b@y.com", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_restore_index() {
        let store = store();
        let index = IndexManager::new(&store);
        let ctx = CallContext::new();

        assert!(index.restore_index(&ctx, "users", "k.json", "u1").await.unwrap());
        assert!(!index.restore_index(&ctx, "users", "k.json", "u1").await.unwrap());

        assert!(!index.restore_index(&ctx, "users", "k.json", "u2").await.unwrap());
        assert_eq!(index.resolve_index(&ctx, "users", "k.json").await.unwrap(), "u1");
    }

    #[tokio::test]
    async fn test_corrupt_pointer() {
        let store = store();
        store.insert_raw("users", "k.json", "garbage");
        let err = IndexManager::new(&store)
            .resolve_index(&CallContext::new(), "users", "k.json")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::CorruptObject { .. }));
    }

    #[tokio::test]
    async fn test_release_owned_removes_recorded_keys() {
        let store = store();
        let index = IndexManager::new(&store);
        let ctx = CallContext::new();
        let owned = vec!["a.json".to_string(), "b.json".to_string()];
        for key in &owned {
            index.create_index(&ctx, "users", key, "u1").await.unwrap();
        }
        index.record_owned(&ctx, "users", "u1", &owned).await.unwrap();
        assert_eq!(index.owned_keys(&ctx, "users", "u1").await.unwrap(), owned);

        assert_eq!(index.release_owned(&ctx, "users", "u1").await, 2);
        assert!(store.keys("users", "").is_empty());
        assert!(index.owned_keys(&ctx, "users", "u1").await.unwrap().is_empty());
    }
}
