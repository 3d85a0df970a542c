//! Single-pass paginated listing over a key prefix.

use std::future::Future;

use blobdoc_shared::types::{PageRequest, PageResponse};
use futures::StreamExt;
use tracing::warn;

use crate::context::CallContext;
use crate::error::DocumentError;
use crate::storage::ObjectStore;

/// Where the listing total comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalHint {
    /// Count every key under the prefix.
    #[default]
    Scan,
    /// Use a known count and stop scanning once the window is filled.
    Known(u64),
}

/// List one page of items under `bucket`/`prefix`.
///
/// Keys are visited once, in key order. Every key adds one to the total; only
/// keys whose position falls in `[offset, offset + page_size)` are handed to
/// `load`, which returns `Ok(None)` to leave an entry out of the page.
///
/// Cancellation is not an error here: the scan stops and the partial page and
/// partial total are returned.
///
/// # Errors
///
/// Returns the first listing error, or the first error from `load` other than
/// cancellation.
pub async fn paginate<S, T, F, Fut>(
    store: &S,
    ctx: &CallContext,
    bucket: &str,
    prefix: &str,
    request: PageRequest,
    hint: TotalHint,
    mut load: F,
) -> Result<PageResponse<T>, DocumentError>
where
    S: ObjectStore,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<T>, DocumentError>>,
{
    let request = request.normalized();
    let window = request.offset()..request.offset() + request.limit();

    let mut keys = store.list(bucket, prefix);
    let mut total: u64 = 0;
    let mut data = Vec::new();

    loop {
        let next = tokio::select! {
            biased;
            () = ctx.done() => {
                warn!(bucket, prefix, scanned = total, "listing cancelled, returning partial page");
                break;
            }
            next = keys.next() => next,
        };
        let Some(key) = next else { break };
        let key = key?;

        if window.contains(&total) {
            match load(key).await {
                Ok(Some(item)) => data.push(item),
                Ok(None) => {}
                Err(err) if err.is_cancelled() => {
                    warn!(
                        bucket,
                        prefix,
                        scanned = total,
                        "listing cancelled, returning partial page"
                    );
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        total += 1;

        if let TotalHint::Known(known) = hint {
            if total >= window.end {
                return Ok(PageResponse::new(data, request, known));
            }
        }
    }

    let total = match hint {
        TotalHint::Scan => total,
        TotalHint::Known(known) => known,
    };
    Ok(PageResponse::new(data, request, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::storage::MemoryStore;

    async fn seeded(count: usize) -> MemoryStore {
        let store = MemoryStore::with_buckets(["posts"]);
        for i in 0..count {
            store
                .put(
                    "posts",
                    &format!("post-{i:03}"),
                    Bytes::from(i.to_string()),
                    "text/plain",
                )
                .await
                .unwrap();
        }
        store.insert_raw("posts", "indexes/tag-x/1.json", "{}");
        store
    }

    async fn load_number(store: &MemoryStore, key: String) -> Result<Option<u32>, DocumentError> {
        let bytes = store.get("posts", &key).await?;
        Ok(std::str::from_utf8(&bytes).ok().and_then(|s| s.parse().ok()))
    }

    #[tokio::test]
    async fn test_first_page() {
        let store = seeded(25).await;
        let page = paginate(
            &store,
            &CallContext::new(),
            "posts",
            "post-",
            PageRequest::new(1, 10),
            TotalHint::Scan,
            |key| load_number(&store, key),
        )
        .await
        .unwrap();

        assert_eq!(page.data, (0..10).collect::<Vec<_>>());
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.offset, 0);
    }

    #[tokio::test]
    async fn test_last_partial_page_and_past_end() {
        let store = seeded(25).await;
        let ctx = CallContext::new();

        let request = PageRequest::new(3, 10);

        let page = paginate(&store, &ctx, "posts", "post-", request, TotalHint::Scan, |key| {
            load_number(&store, key)
        })
        .await
        .unwrap();
        assert_eq!(page.data, (20..25).collect::<Vec<_>>());
        assert_eq!(page.pagination.offset, 20);

        let request = PageRequest::new(9, 10);

        let page = paginate(&store, &ctx, "posts", "post-", request, TotalHint::Scan, |key| {
            load_number(&store, key)
        })
        .await
        .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total, 25);
    }

    #[tokio::test]
    async fn test_only_window_is_loaded() {
        let store = seeded(30).await;
        let mut loaded = Vec::new();
        let page = paginate(
            &store,
            &CallContext::new(),
            "posts",
            "post-",
            PageRequest::new(2, 5),
            TotalHint::Scan,
            |key| {
                loaded.push(key.clone());
                load_number(&store, key)
            },
        )
        .await
        .unwrap();

        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded[0], "post-005");
        assert_eq!(page.pagination.total, 30);
    }

    #[tokio::test]
    async fn test_page_size_is_clamped() {
        let store = seeded(150).await;
        let page = paginate(
            &store,
            &CallContext::new(),
            "posts",
            "post-",
            PageRequest::new(0, 1000),
            TotalHint::Scan,
            |key| load_number(&store, key),
        )
        .await
        .unwrap();

        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.page_size, 100);
        assert_eq!(page.data.len(), 100);
        assert_eq!(page.pagination.total, 150);
    }

    #[tokio::test]
    async fn test_known_total_stops_early() {
        let store = seeded(40).await;
        let mut loads = 0;
        let page = paginate(
            &store,
            &CallContext::new(),
            "posts",
            "post-",
            PageRequest::new(1, 10),
            TotalHint::Known(40),
            |key| {
                loads += 1;
                load_number(&store, key)
            },
        )
        .await
        .unwrap();

        assert_eq!(loads, 10);
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.pagination.total, 40);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_returns_empty_page() {
        let store = seeded(5).await;
        let ctx = CallContext::new();
        ctx.cancel();

        let request = PageRequest::default();

        let page = paginate(&store, &ctx, "posts", "post-", request, TotalHint::Scan, |key| {
            load_number(&store, key)
        })
        .await
        .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_scan_returns_partial_page() {
        let store = seeded(10).await;
        let ctx = CallContext::new();
        let mut seen = 0;

        let request = PageRequest::new(1, 10);

        let page = paginate(&store, &ctx, "posts", "post-", request, TotalHint::Scan, |key| {
            seen += 1;
            if seen == 4 {
                ctx.cancel();
            }
            load_number(&store, key)
        })
        .await
        .unwrap();

        assert_eq!(page.data, vec![0, 1, 2, 3]);
        assert_eq!(page.pagination.total, 4);
    }

    #[tokio::test]
    async fn test_listing_error_propagates() {
        let store = MemoryStore::with_buckets(["posts"]);
        let err = paginate(
            &store,
            &CallContext::new(),
            "users",
            "user-",
            PageRequest::default(),
            TotalHint::Scan,
            |key| load_number(&store, key),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DocumentError::StoreUnavailable { .. }));
    }
}
