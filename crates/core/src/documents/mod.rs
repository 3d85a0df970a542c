//! Entity CRUD over the object store.
//!
//! [`DocumentStore`] is the only place that knows about users, posts and
//! files. Each entity type has a repository borrowed from the store:
//!
//! ```no_run
//! # use blobdoc_core::documents::DocumentStore;
//! # use blobdoc_core::model::NewUser;
//! # use blobdoc_core::storage::MemoryStore;
//! # use blobdoc_shared::{BucketSettings, DocumentSettings};
//! # async fn demo() -> Result<(), blobdoc_core::DocumentError> {
//! let docs = DocumentStore::new(
//!     MemoryStore::with_buckets(["users", "posts", "files"]),
//!     BucketSettings::default(),
//!     DocumentSettings::default(),
//! );
//! let ctx = docs.context();
//! let user = docs.users().create(&ctx, NewUser::new("alice", "a@x.com", "hash")).await?;
//! # Ok(())
//! # }
//! ```

mod counter;
mod files;
mod objects;
mod posts;
mod users;

use std::sync::Arc;
use std::time::Duration;

use blobdoc_shared::{BucketSettings, DocumentSettings};
use serde::Serialize;
use tracing::warn;

use crate::context::CallContext;
use crate::storage::{ObjectStore, OpendalStore, StorageError, StoreConfig};

pub use counter::Counters;
pub use files::FileRepository;
pub use posts::PostRepository;
pub use users::UserRepository;

/// Default deadline for one document operation.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Users, posts and files on one object store.
#[derive(Debug)]
pub struct DocumentStore<S> {
    store: Arc<S>,
    buckets: BucketSettings,
    settings: DocumentSettings,
    request_timeout: Duration,
}

impl<S> Clone for DocumentStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            buckets: self.buckets.clone(),
            settings: self.settings,
            request_timeout: self.request_timeout,
        }
    }
}

impl DocumentStore<OpendalStore> {
    /// Connect to the store described by `config`.
    ///
    /// No network call is made here; use [`DocumentStore::health`] to probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be initialized.
    pub fn connect(config: StoreConfig, settings: DocumentSettings) -> Result<Self, StorageError> {
        let buckets = config.buckets.clone();
        let timeout = config.request_timeout;
        let store = OpendalStore::from_config(config)?;
        Ok(Self::new(store, buckets, settings).with_request_timeout(timeout))
    }
}

impl<S: ObjectStore> DocumentStore<S> {
    /// Wrap an object store.
    #[must_use]
    pub fn new(store: S, buckets: BucketSettings, settings: DocumentSettings) -> Self {
        Self {
            store: Arc::new(store),
            buckets,
            settings,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the deadline used by [`DocumentStore::context`].
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// A fresh context carrying the default request deadline.
    #[must_use]
    pub fn context(&self) -> CallContext {
        CallContext::with_timeout(self.request_timeout)
    }

    /// The underlying object store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bucket names in use.
    #[must_use]
    pub fn buckets(&self) -> &BucketSettings {
        &self.buckets
    }

    /// Optional behaviors in effect.
    #[must_use]
    pub fn settings(&self) -> DocumentSettings {
        self.settings
    }

    /// User documents.
    #[must_use]
    pub fn users(&self) -> UserRepository<'_, S> {
        UserRepository::new(&self.store, &self.buckets.users, self.settings)
    }

    /// Post documents.
    #[must_use]
    pub fn posts(&self) -> PostRepository<'_, S> {
        PostRepository::new(&self.store, &self.buckets.posts, self.settings)
    }

    /// File documents.
    #[must_use]
    pub fn files(&self) -> FileRepository<'_, S> {
        FileRepository::new(&self.store, &self.buckets.files, self.settings)
    }

    /// Probe every bucket. Never fails; unreachable buckets are reported.
    pub async fn health(&self, ctx: &CallContext) -> HealthReport {
        let mut buckets = Vec::with_capacity(3);
        for name in [&self.buckets.users, &self.buckets.posts, &self.buckets.files] {
            let error = match ctx.run("probe", self.store.probe(name)).await {
                Ok(()) => None,
                Err(err) => {
                    warn!(bucket = %name, error = %err, "bucket unreachable");
                    Some(err.to_string())
                }
            };
            buckets.push(BucketHealth {
                name: name.clone(),
                reachable: error.is_none(),
                error,
            });
        }
        HealthReport { buckets }
    }
}

/// Reachability of the configured buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// One entry per bucket: users, posts, files.
    pub buckets: Vec<BucketHealth>,
}

impl HealthReport {
    /// Whether every bucket answered.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.reachable)
    }
}

/// Reachability of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketHealth {
    /// Bucket name.
    pub name: String,
    /// Whether the probe succeeded.
    pub reachable: bool,
    /// Probe error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
