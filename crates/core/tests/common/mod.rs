//! Shared setup for document store integration tests.

#![allow(dead_code)]

use blobdoc_core::DocumentStore;
use blobdoc_core::model::NewUser;
use blobdoc_core::storage::MemoryStore;
use blobdoc_shared::{BucketSettings, DocumentSettings};

/// Document store over empty in-memory buckets.
pub fn docs() -> DocumentStore<MemoryStore> {
    docs_with(DocumentSettings::default())
}

/// Document store with the given optional behaviors.
pub fn docs_with(settings: DocumentSettings) -> DocumentStore<MemoryStore> {
    DocumentStore::new(
        MemoryStore::with_buckets(["users", "posts", "files"]),
        BucketSettings::default(),
        settings,
    )
}

/// Document store whose calls yield to the scheduler, so joined futures interleave.
pub fn interleaved_docs() -> DocumentStore<MemoryStore> {
    DocumentStore::new(
        MemoryStore::with_buckets(["users", "posts", "files"]).interleaved(),
        BucketSettings::default(),
        DocumentSettings::default(),
    )
}

/// Minimal user input.
pub fn new_user(username: &str, email: &str) -> NewUser {
    NewUser::new(username, email, "$argon2id$v=19$test_hash")
}
