//! Property-based tests for the entity codec.
//!
//! - Arbitrary field content survives encode then decode
//! - Extra fields in a stored object never change the decoded entity

use std::collections::HashMap;

use blobdoc_shared::types::{FileId, UserId};
use chrono::{DateTime, Utc};
use proptest::prelude::*;

use super::{decode, encode};
use crate::model::FileMetadata;

fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap_or_default())
}

fn file_metadata() -> impl Strategy<Value = FileMetadata> {
    (
        ".{0,40}",
        "[a-z]{1,10}/[a-z0-9.+-]{1,20}",
        any::<u64>(),
        prop::collection::hash_map(".{0,12}", ".{0,24}", 0..6),
        timestamp(),
    )
        .prop_map(|(original_name, content_type, size, metadata, created_at)| {
            let id = FileId::new();
            let user_id = UserId::new();
            FileMetadata {
                id,
                user_id,
                file_name: format!("{id}.bin"),
                original_name,
                content_type,
                size,
                path: format!("{user_id}/{id}.bin"),
                metadata,
                created_at,
                updated_at: created_at,
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* file metadata, decoding the encoded bytes yields the same value.
    #[test]
    fn prop_file_metadata_survives_encoding(file in file_metadata()) {
        let bytes = encode("files", "k", &file).unwrap();
        let decoded: FileMetadata = decode("files", "k", &bytes).unwrap();
        prop_assert_eq!(decoded, file);
    }

    /// *For any* set of unknown top-level fields, decoding ignores them.
    #[test]
    fn prop_unknown_fields_are_ignored(
        file in file_metadata(),
        extra in prop::collection::hash_map("x[a-zA-Z]{1,8}", any::<i32>(), 0..5),
    ) {
        let mut json = serde_json::to_value(&file).unwrap();
        let object = json.as_object_mut().unwrap();
        for (key, value) in &extra {
            object.insert(key.clone(), serde_json::json!(value));
        }
        let bytes = serde_json::to_vec(&json).unwrap();

        let decoded: FileMetadata = decode("files", "k", &bytes).unwrap();
        prop_assert_eq!(decoded, file);
    }
}

#[test]
fn test_empty_metadata_map_defaults() {
    let file = FileMetadata {
        id: FileId::new(),
        user_id: UserId::new(),
        file_name: "a".to_string(),
        original_name: "a".to_string(),
        content_type: "text/plain".to_string(),
        size: 0,
        path: "u/a".to_string(),
        metadata: HashMap::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let mut json = serde_json::to_value(&file).unwrap();
    json.as_object_mut().unwrap().remove("metadata");
    let decoded: FileMetadata = decode("files", "k", &serde_json::to_vec(&json).unwrap()).unwrap();
    assert!(decoded.metadata.is_empty());
}
