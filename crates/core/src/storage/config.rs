//! Storage configuration types.

use std::path::PathBuf;
use std::time::Duration;

use blobdoc_shared::config::{BucketSettings, StoreSettings};
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Storage provider configuration.
///
/// The provider describes where and how to connect. Bucket names live in
/// [`StoreConfig`], and one operator is built per bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: MinIO, Cloudflare R2, Supabase, AWS S3
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
    },
    /// Local filesystem (development only). Each bucket is a subdirectory of `root`.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory (tests and demos). Contents are lost on drop.
    Memory,
}

impl StorageProvider {
    /// Create S3-compatible provider.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(account: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local_fs",
            Self::Memory => "memory",
        }
    }

    /// Whether the backend returns recursive listings in key order.
    #[must_use]
    pub fn lists_in_key_order(&self) -> bool {
        !matches!(self, Self::LocalFs { .. })
    }
}

/// Object store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Bucket names.
    pub buckets: BucketSettings,
    /// Default deadline for one document operation.
    pub request_timeout: Duration,
}

impl StoreConfig {
    /// Default request timeout: 30 seconds.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new store config with default bucket names and timeout.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            buckets: BucketSettings::default(),
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set bucket names.
    #[must_use]
    pub fn with_buckets(mut self, buckets: BucketSettings) -> Self {
        self.buckets = buckets;
        self
    }

    /// Set the default request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Bucket names in a fixed order: users, posts, files.
    #[must_use]
    pub fn bucket_names(&self) -> [&str; 3] {
        [
            self.buckets.users.as_str(),
            self.buckets.posts.as_str(),
            self.buckets.files.as_str(),
        ]
    }

    /// Build from loaded application settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown provider or missing credentials.
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, StorageError> {
        let required = |value: &Option<String>, name: &str| {
            value.clone().ok_or_else(|| {
                StorageError::configuration(format!(
                    "store.{name} is required for provider {}",
                    settings.provider
                ))
            })
        };

        let provider = match settings.provider.as_str() {
            "s3" => StorageProvider::s3(
                required(&settings.endpoint, "endpoint")?,
                required(&settings.access_key_id, "access_key_id")?,
                required(&settings.secret_access_key, "secret_access_key")?,
                settings.region.clone(),
            ),
            "azure_blob" => StorageProvider::azure_blob(
                required(&settings.access_key_id, "access_key_id")?,
                required(&settings.secret_access_key, "secret_access_key")?,
            ),
            "local_fs" => StorageProvider::local_fs(required(&settings.root, "root")?),
            "memory" => StorageProvider::Memory,
            other => {
                return Err(StorageError::configuration(format!(
                    "unknown storage provider: {other}"
                )));
            }
        };

        Ok(Self::new(provider)
            .with_buckets(settings.buckets.clone())
            .with_request_timeout(Duration::from_secs(settings.request_timeout_secs)))
    }
}
