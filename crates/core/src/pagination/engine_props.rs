//! Property-based tests for the pagination engine.
//!
//! - Window: a page holds exactly the keys at positions `[offset, offset + size)`
//! - Total: a full scan counts every key under the prefix and nothing else

use blobdoc_shared::types::PageRequest;
use bytes::Bytes;
use proptest::prelude::*;

use super::engine::{TotalHint, paginate};
use crate::context::CallContext;
use crate::error::DocumentError;
use crate::storage::{MemoryStore, ObjectStore};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

/// Store with `count` primary keys plus unrelated keys that share no prefix.
fn store_with(count: usize, noise: usize) -> MemoryStore {
    let store = MemoryStore::with_buckets(["users"]);
    for i in 0..count {
        store.insert_raw("users", &format!("user-{i:04}"), Bytes::from(i.to_string()));
    }
    for i in 0..noise {
        store.insert_raw("users", &format!("indexes/username-{i}.json"), "{}");
    }
    store
}

async fn load_key(store: &MemoryStore, key: String) -> Result<Option<String>, DocumentError> {
    store.get("users", &key).await?;
    Ok(Some(key))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// *For any* collection size and page request, the page contains the keys at
    /// the requested window in key order, and the total is the collection size.
    #[test]
    fn prop_page_is_the_requested_window(
        count in 0usize..120,
        noise in 0usize..10,
        page in 0u32..15,
        page_size in 0u32..130,
    ) {
        let store = store_with(count, noise);
        let request = PageRequest::new(page, page_size);
        let result = block_on(paginate(
            &store,
            &CallContext::new(),
            "users",
            "user-",
            request,
            TotalHint::Scan,
            |key| load_key(&store, key),
        ))
        .unwrap();

        let normalized = request.normalized();
        let all = store.keys("users", "user-");
        let start = usize::try_from(normalized.offset()).unwrap().min(all.len());
        let end = (start + normalized.page_size as usize).min(all.len());

        prop_assert_eq!(&result.data, &all[start..end].to_vec());
        prop_assert_eq!(result.pagination.total, count as u64);
        prop_assert!(result.data.len() <= normalized.page_size as usize);
        prop_assert_eq!(result.pagination.offset, normalized.offset());
    }

    /// *For any* collection, walking pages until one comes back short visits
    /// every key exactly once.
    #[test]
    fn prop_pages_partition_the_collection(
        count in 0usize..80,
        page_size in 1u32..20,
    ) {
        let store = store_with(count, 3);
        let ctx = CallContext::new();
        let mut seen = Vec::new();
        let mut page = 1;
        loop {
            let result = block_on(paginate(
                &store,
                &ctx,
                "users",
                "user-",
                PageRequest::new(page, page_size),
                TotalHint::Scan,
                |key| load_key(&store, key),
            ))
            .unwrap();
            let short = result.data.len() < page_size as usize;
            seen.extend(result.data);
            if short {
                break;
            }
            page += 1;
        }

        prop_assert_eq!(seen, store.keys("users", "user-"));
    }

    /// *For any* known total, the reported total is the known one and the page
    /// content is unchanged.
    #[test]
    fn prop_known_total_keeps_the_window(
        count in 0usize..60,
        page in 1u32..6,
        page_size in 1u32..15,
    ) {
        let store = store_with(count, 0);
        let ctx = CallContext::new();
        let request = PageRequest::new(page, page_size);

        let scanned = block_on(paginate(
            &store,
            &ctx,
            "users",
            "user-",
            request,
            TotalHint::Scan,
            |key| load_key(&store, key),
        ))
        .unwrap();
        let known = block_on(paginate(
            &store,
            &ctx,
            "users",
            "user-",
            request,
            TotalHint::Known(count as u64),
            |key| load_key(&store, key),
        ))
        .unwrap();

        prop_assert_eq!(known.data, scanned.data);
        prop_assert_eq!(known.pagination.total, scanned.pagination.total);
    }
}
