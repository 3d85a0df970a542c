//! Object store client implementation using Apache OpenDAL.

use std::collections::HashMap;

use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt, future};
use opendal::{EntryMode, Operator, services};
use tracing::debug;

use super::client::{ObjectInfo, ObjectStore, ObjectVersion};
use super::config::{StorageProvider, StoreConfig};
use super::error::StorageError;

/// Object store backed by one OpenDAL operator per bucket.
#[derive(Debug, Clone)]
pub struct OpendalStore {
    operators: HashMap<String, Operator>,
    config: StoreConfig,
}

impl OpendalStore {
    /// Create a new store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StoreConfig) -> Result<Self, StorageError> {
        let mut operators = HashMap::new();
        for bucket in config.bucket_names() {
            let operator = Self::create_operator(&config.provider, bucket)?;
            operators.insert(bucket.to_string(), operator);
        }
        Ok(Self { operators, config })
    }

    /// Create OpenDAL operator for one bucket.
    fn create_operator(provider: &StorageProvider, bucket: &str) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder).map_err(init_error)?.finish()
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(bucket);
                Operator::new(builder).map_err(init_error)?.finish()
            }
            StorageProvider::LocalFs { root } => {
                let path = root.join(bucket);
                let builder = services::Fs::default().root(
                    path.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );
                Operator::new(builder).map_err(init_error)?.finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(init_error)?
                .finish(),
        };
        Ok(operator)
    }

    fn operator(&self, bucket: &str) -> Result<&Operator, StorageError> {
        self.operators
            .get(bucket)
            .ok_or_else(|| StorageError::UnknownBucket(bucket.to_string()))
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl ObjectStore for OpendalStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<ObjectVersion, StorageError> {
        debug!(bucket, key, size = body.len(), "put object");
        let operator = self.operator(bucket)?;
        let mut write = operator.write_with(key, body);
        // fs and memory reject the option instead of ignoring it
        if operator.info().full_capability().write_with_content_type {
            write = write.content_type(content_type);
        }
        let meta = write
            .await
            .map_err(|e| StorageError::from_opendal(&e, bucket, key, "put"))?;

        Ok(ObjectVersion(
            meta.version().or_else(|| meta.etag()).map(String::from),
        ))
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        debug!(bucket, key, "get object");
        let buffer = self
            .operator(bucket)?
            .read(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, bucket, key, "get"))?;
        Ok(buffer.to_bytes())
    }

    async fn stat(&self, bucket: &str, key: &str) -> Result<ObjectInfo, StorageError> {
        let meta = self
            .operator(bucket)?
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, bucket, key, "stat"))?;

        Ok(ObjectInfo {
            size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
        })
    }

    fn list<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxStream<'a, Result<String, StorageError>> {
        let operator = match self.operator(bucket) {
            Ok(op) => op.clone(),
            Err(err) => return stream::once(future::ready(Err(err))).boxed(),
        };
        debug!(bucket, prefix, "list objects");

        // OpenDAL lists directories, so walk the prefix's parent and filter.
        let dir = parent_dir(prefix);
        let lister = async move {
            operator
                .lister_with(&dir)
                .recursive(true)
                .await
                .map_err(|e| StorageError::from_opendal(&e, bucket, prefix, "list"))
        };

        let keys = stream::once(lister)
            .map_ok(move |lister| {
                lister.map_err(move |e| StorageError::from_opendal(&e, bucket, prefix, "list"))
            })
            .try_flatten()
            .try_filter_map(move |entry| {
                let key = (entry.metadata().mode() == EntryMode::FILE
                    && entry.path().starts_with(prefix))
                .then(|| entry.path().to_string());
                future::ready(Ok(key))
            });

        if self.config.provider.lists_in_key_order() {
            return keys.boxed();
        }

        let sorted = async move {
            let mut all: Vec<String> = keys.try_collect().await?;
            all.sort();
            Ok::<_, StorageError>(stream::iter(all.into_iter().map(Ok::<_, StorageError>)))
        };
        stream::once(sorted).try_flatten().boxed()
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        debug!(bucket, key, "delete object");
        self.operator(bucket)?
            .delete(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, bucket, key, "delete"))
    }

    async fn probe(&self, bucket: &str) -> Result<(), StorageError> {
        self.operator(bucket)?
            .check()
            .await
            .map_err(|e| StorageError::from_opendal(&e, bucket, "", "probe"))
    }
}

fn init_error(err: opendal::Error) -> StorageError {
    StorageError::configuration(err.to_string())
}

/// Directory part of a listing prefix, as OpenDAL expects it.
///
/// `"alice/metadata/"` stays as is, `"user-"` lists from the root.
fn parent_dir(prefix: &str) -> String {
    match prefix.rfind('/') {
        Some(idx) => prefix[..=idx].to_string(),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn memory_store() -> OpendalStore {
        OpendalStore::from_config(StoreConfig::new(StorageProvider::Memory))
            .expect("should create store")
    }

    fn local_fs_store(root: &std::path::Path) -> OpendalStore {
        OpendalStore::from_config(StoreConfig::new(StorageProvider::local_fs(root)))
            .expect("should create store")
    }

    async fn seed(store: &OpendalStore) {
        let users = [
            "user-c",
            "indexes/username-a.json",
            "user-a",
            "counters/users.json",
            "user-b",
        ];
        for key in users {
            store
                .put("users", key, Bytes::from_static(b"{}"), "application/json")
                .await
                .unwrap();
        }
        let files = [
            "u1/metadata/f2.json",
            "u1/f1.pdf",
            "u2/metadata/f3.json",
            "u1/metadata/f1.json",
        ];
        for key in files {
            store
                .put("files", key, Bytes::from_static(b"{}"), "application/json")
                .await
                .unwrap();
        }
    }

    async fn listed(store: &OpendalStore, bucket: &str, prefix: &str) -> Vec<String> {
        store.list(bucket, prefix).try_collect().await.unwrap()
    }

    #[rstest]
    #[case::memory(false)]
    #[case::local_fs(true)]
    #[tokio::test]
    async fn test_list_filters_prefix_in_key_order(#[case] on_disk: bool) {
        let dir = tempfile::tempdir().unwrap();
        let store = if on_disk {
            local_fs_store(dir.path())
        } else {
            memory_store()
        };
        seed(&store).await;

        assert_eq!(listed(&store, "users", "user-").await, ["user-a", "user-b", "user-c"]);
        assert_eq!(
            listed(&store, "files", "u1/metadata/").await,
            ["u1/metadata/f1.json", "u1/metadata/f2.json"]
        );
        assert_eq!(
            listed(&store, "users", "indexes/").await,
            ["indexes/username-a.json"]
        );
        assert!(listed(&store, "users", "post-").await.is_empty());
    }

    #[tokio::test]
    async fn test_list_unknown_bucket_fails() {
        let store = memory_store();
        let result: Result<Vec<String>, _> = store.list("logs", "").try_collect().await;
        assert!(matches!(result, Err(StorageError::UnknownBucket(_))));
    }

    #[tokio::test]
    async fn test_local_fs_keeps_buckets_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_fs_store(dir.path());
        store
            .put("users", "user-1", Bytes::from_static(b"{}"), "application/json")
            .await
            .unwrap();

        assert!(dir.path().join("users").join("user-1").is_file());
        assert!(store.get("posts", "user-1").await.unwrap_err().is_not_found());
        assert_eq!(store.provider_name(), "local_fs");
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("user-"), "/");
        assert_eq!(parent_dir(""), "/");
        assert_eq!(parent_dir("u1/metadata/"), "u1/metadata/");
        assert_eq!(parent_dir("indexes/tag-rust/abc"), "indexes/tag-rust/");
    }

    #[test]
    fn test_one_operator_per_bucket() {
        let store = memory_store();
        assert_eq!(store.provider_name(), "memory");
        assert!(store.operator("users").is_ok());
        assert!(store.operator("posts").is_ok());
        assert!(store.operator("files").is_ok());
        assert!(matches!(
            store.operator("logs"),
            Err(StorageError::UnknownBucket(_))
        ));
    }

    #[tokio::test]
    async fn test_put_get_stat_delete() {
        let store = memory_store();
        store
            .put("files", "u1/f1.pdf", Bytes::from_static(b"%PDF"), "application/pdf")
            .await
            .unwrap();

        let body = store.get("files", "u1/f1.pdf").await.unwrap();
        assert_eq!(body.as_ref(), b"%PDF");
        let info = store.stat("files", "u1/f1.pdf").await.unwrap();
        assert_eq!(info.size, 4);

        store.delete("files", "u1/f1.pdf").await.unwrap();
        store.delete("files", "u1/f1.pdf").await.unwrap();
        let err = store.get("files", "u1/f1.pdf").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_buckets_are_isolated() {
        let store = memory_store();
        store
            .put("users", "user-1", Bytes::from_static(b"{}"), "application/json")
            .await
            .unwrap();
        assert!(store.get("posts", "user-1").await.unwrap_err().is_not_found());
    }
}
