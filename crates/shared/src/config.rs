//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Object store configuration.
    pub store: StoreSettings,
    /// Document layer behavior.
    #[serde(default)]
    pub documents: DocumentSettings,
}

/// Object store connection settings.
///
/// Credentials are optional because the `local_fs` and `memory` providers
/// do not use them.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Provider kind: `s3`, `azure_blob`, `local_fs` or `memory`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Service endpoint URL (S3-compatible providers).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Region (S3-compatible providers).
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key ID, or Azure account name.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key, or Azure account key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Root directory (`local_fs` provider).
    #[serde(default)]
    pub root: Option<String>,
    /// Bucket names.
    #[serde(default)]
    pub buckets: BucketSettings,
    /// Default deadline for a single document operation, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Names of the three buckets the application uses.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BucketSettings {
    /// Bucket holding users and their indexes.
    #[serde(default = "default_users_bucket")]
    pub users: String,
    /// Bucket holding posts and their indexes.
    #[serde(default = "default_posts_bucket")]
    pub posts: String,
    /// Bucket holding file content, file metadata and their indexes.
    #[serde(default = "default_files_bucket")]
    pub files: String,
}

impl Default for BucketSettings {
    fn default() -> Self {
        Self {
            users: default_users_bucket(),
            posts: default_posts_bucket(),
            files: default_files_bucket(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_users_bucket() -> String {
    "users".to_string()
}

fn default_posts_bucket() -> String {
    "posts".to_string()
}

fn default_files_bucket() -> String {
    "files".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Optional behaviors of the document layer. Both are off by default.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct DocumentSettings {
    /// Record the index keys each entity owns and remove them on delete.
    #[serde(default)]
    pub index_cleanup: bool,
    /// Keep a per-entity-type counter object and use it as the listing total.
    #[serde(default)]
    pub counted_totals: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BLOBDOC").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("BLOBDOC__STORE__PROVIDER", Some("s3")),
                ("BLOBDOC__STORE__ENDPOINT", Some("http://localhost:9000")),
                ("BLOBDOC__STORE__BUCKETS__USERS", Some("people")),
                ("BLOBDOC__DOCUMENTS__INDEX_CLEANUP", Some("true")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.store.provider, "s3");
                assert_eq!(
                    config.store.endpoint.as_deref(),
                    Some("http://localhost:9000")
                );
                assert_eq!(config.store.buckets.users, "people");
                assert_eq!(config.store.buckets.posts, "posts");
                assert_eq!(config.store.request_timeout_secs, 30);
                assert!(config.documents.index_cleanup);
                assert!(!config.documents.counted_totals);
            },
        );
    }

    #[test]
    fn test_bucket_defaults() {
        let buckets = BucketSettings::default();
        assert_eq!(buckets.users, "users");
        assert_eq!(buckets.posts, "posts");
        assert_eq!(buckets.files, "files");
    }
}
