//! Key layout for index objects.
//!
//! ```text
//! indexes/{dimension}-{value}.json               unique: one pointer per value
//! indexes/{dimension}-{value}/{primaryId}.json   non-unique: one pointer per (value, id)
//! indexes/owners/{primaryId}.json                index keys an entity owns
//! ```

/// Root of every index object.
pub const INDEX_ROOT: &str = "indexes/";

/// A secondary lookup dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// User login name (unique).
    Username,
    /// User email (unique).
    Email,
    /// Post publication status.
    Status,
    /// Post tag.
    Tag,
    /// Owning user of a post or file.
    Owner,
    /// File content type.
    ContentType,
    /// File creation date (`YYYY-MM-DD`).
    Date,
}

impl Dimension {
    /// Name used in keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Status => "status",
            Self::Tag => "tag",
            Self::Owner => "owner",
            Self::ContentType => "content-type",
            Self::Date => "date",
        }
    }
}

/// Key of the single pointer for a unique value.
#[must_use]
pub fn unique_key(dimension: Dimension, value: &str) -> String {
    format!("{INDEX_ROOT}{}-{}.json", dimension.as_str(), escape(value))
}

/// Prefix under which all pointers for a non-unique value live.
#[must_use]
pub fn pointer_prefix(dimension: Dimension, value: &str) -> String {
    format!("{INDEX_ROOT}{}-{}/", dimension.as_str(), escape(value))
}

/// Key of the pointer for one (value, primary id) pair.
#[must_use]
pub fn pointer_key(dimension: Dimension, value: &str, primary_id: &str) -> String {
    format!(
        "{}{}.json",
        pointer_prefix(dimension, value),
        escape(primary_id)
    )
}

/// Key of the reverse index for one entity.
#[must_use]
pub fn reverse_key(primary_id: &str) -> String {
    format!("{INDEX_ROOT}owners/{}.json", escape(primary_id))
}

/// Escape `/` and `%` so a value never adds a path segment.
fn escape(value: &str) -> String {
    value.replace('%', "%25").replace('/', "%2F")
}
