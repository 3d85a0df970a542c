//! Entities stored by the document layer.
//!
//! Field names follow the application's JSON shapes (camelCase). Unknown fields
//! are ignored on read; optional attributes default when missing.

use std::collections::HashMap;

use blobdoc_shared::types::{FileId, PostId, UserId};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Login name, globally unique.
    pub username: String,
    /// Email address, globally unique.
    pub email: String,
    /// Password hash, produced outside this layer.
    pub password_hash: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Role name, e.g. `user` or `admin`.
    #[serde(default = "default_role")]
    pub role: String,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

fn default_role() -> String {
    "user".to_string()
}

/// Input for creating a user. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password hash.
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Role name.
    pub role: String,
    /// Avatar URL.
    pub avatar: Option<String>,
}

impl NewUser {
    /// Minimal input with the default role and empty names.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            first_name: String::new(),
            last_name: String::new(),
            role: default_role(),
            avatar: None,
        }
    }
}

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Not visible to readers.
    #[default]
    Draft,
    /// Publicly visible.
    Published,
    /// Hidden, kept for reference.
    Archived,
}

impl PostStatus {
    /// Stored string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

/// A post written by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique identifier.
    pub id: PostId,
    /// Author.
    pub user_id: UserId,
    /// Title.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Short summary.
    #[serde(default)]
    pub summary: String,
    /// Publication state.
    #[serde(default)]
    pub status: PostStatus,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewPost {
    /// Author.
    pub user_id: UserId,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Short summary.
    pub summary: String,
    /// Publication state.
    pub status: PostStatus,
    /// Free-form tags.
    pub tags: Vec<String>,
}

/// Metadata describing an uploaded file. Stored apart from the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Unique identifier.
    pub id: FileId,
    /// Owner.
    pub user_id: UserId,
    /// Stored name, `{id}.{ext}`.
    pub file_name: String,
    /// Name the file was uploaded with.
    pub original_name: String,
    /// MIME type supplied at upload.
    pub content_type: String,
    /// Content size in bytes.
    pub size: u64,
    /// Key of the content object.
    pub path: String,
    /// Caller-defined attributes.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for uploading a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Owner.
    pub user_id: UserId,
    /// Name the file was uploaded with; its extension is kept in the stored name.
    pub original_name: String,
    /// MIME type, stored with the content object.
    pub content_type: String,
    /// File content.
    pub body: Bytes,
    /// Caller-defined attributes.
    pub metadata: HashMap<String, String>,
}

/// File content as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    /// File content.
    pub body: Bytes,
    /// MIME type recorded at upload.
    pub content_type: String,
}

/// Pointer from a derived key to a primary object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Id of the primary object.
    pub primary_id: String,
}

/// Index keys owned by one entity, so delete can find them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReverseIndex {
    /// Index keys, in the entity's bucket.
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Denormalized object count for one listing prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counter {
    /// Number of objects.
    #[serde(default)]
    pub count: u64,
}
