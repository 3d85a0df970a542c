//! In-process object store.
//!
//! Keys are kept in a `BTreeMap` per bucket, so listings come back in key order
//! like S3. Write failures can be injected per key prefix, and every call can
//! yield to the scheduler first so that concurrent callers interleave.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};

use super::client::{ObjectInfo, ObjectStore, ObjectVersion};
use super::error::StorageError;

#[derive(Debug, Clone)]
struct MemoryObject {
    body: Bytes,
    content_type: String,
}

type Buckets = HashMap<String, BTreeMap<String, MemoryObject>>;

/// Object store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: Mutex<Buckets>,
    failing_puts: Mutex<Vec<(String, String)>>,
    interleave: bool,
    versions: AtomicU64,
}

impl MemoryStore {
    /// Create a store with the given (empty) buckets.
    #[must_use]
    pub fn with_buckets<I, B>(buckets: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<String>,
    {
        let buckets = buckets
            .into_iter()
            .map(|name| (name.into(), BTreeMap::new()))
            .collect();
        Self {
            buckets: Mutex::new(buckets),
            ..Self::default()
        }
    }

    /// Yield to the scheduler at the start of every call.
    #[must_use]
    pub fn interleaved(mut self) -> Self {
        self.interleave = true;
        self
    }

    /// Make every `put` to a key starting with `key_prefix` fail as unavailable.
    pub fn fail_puts_with_prefix(&self, bucket: impl Into<String>, key_prefix: impl Into<String>) {
        lock(&self.failing_puts).push((bucket.into(), key_prefix.into()));
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        lock(&self.failing_puts).clear();
    }

    /// Whether an object exists, without going through the async contract.
    #[must_use]
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        lock(&self.buckets)
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key))
    }

    /// Keys under `prefix`, in order.
    #[must_use]
    pub fn keys(&self, bucket: &str, prefix: &str) -> Vec<String> {
        self.snapshot(bucket, prefix).unwrap_or_default()
    }

    /// Write raw bytes directly, bypassing failure injection.
    pub fn insert_raw(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        lock(&self.buckets)
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                MemoryObject {
                    body: body.into(),
                    content_type: "application/octet-stream".to_string(),
                },
            );
    }

    async fn pause(&self) {
        if self.interleave {
            tokio::task::yield_now().await;
        }
    }

    fn snapshot(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let buckets = lock(&self.buckets);
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::UnknownBucket(bucket.to_string()))?;
        Ok(objects
            .range(prefix.to_string()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn check_put(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let failing = lock(&self.failing_puts)
            .iter()
            .any(|(b, prefix)| b == bucket && key.starts_with(prefix.as_str()));
        if failing {
            return Err(StorageError::unavailable(
                bucket,
                key,
                "put",
                "injected write failure",
            ));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<ObjectVersion, StorageError> {
        self.pause().await;
        self.check_put(bucket, key)?;

        let mut buckets = lock(&self.buckets);
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::UnknownBucket(bucket.to_string()))?;
        objects.insert(
            key.to_string(),
            MemoryObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        let version = self.versions.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(ObjectVersion(Some(version.to_string())))
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        self.pause().await;
        let buckets = lock(&self.buckets);
        buckets
            .get(bucket)
            .ok_or_else(|| StorageError::UnknownBucket(bucket.to_string()))?
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }

    async fn stat(&self, bucket: &str, key: &str) -> Result<ObjectInfo, StorageError> {
        self.pause().await;
        let buckets = lock(&self.buckets);
        buckets
            .get(bucket)
            .ok_or_else(|| StorageError::UnknownBucket(bucket.to_string()))?
            .get(key)
            .map(|object| ObjectInfo {
                size: object.body.len() as u64,
                content_type: Some(object.content_type.clone()),
            })
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }

    fn list<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxStream<'a, Result<String, StorageError>> {
        let listing = async move {
            self.pause().await;
            self.snapshot(bucket, prefix)
                .map(|keys| stream::iter(keys.into_iter().map(Ok::<_, StorageError>)))
        };
        stream::once(listing).try_flatten().boxed()
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.pause().await;
        let mut buckets = lock(&self.buckets);
        buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::UnknownBucket(bucket.to_string()))?
            .remove(key);
        Ok(())
    }

    async fn probe(&self, bucket: &str) -> Result<(), StorageError> {
        self.pause().await;
        if lock(&self.buckets).contains_key(bucket) {
            Ok(())
        } else {
            Err(StorageError::UnknownBucket(bucket.to_string()))
        }
    }
}
