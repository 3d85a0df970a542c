//! JSON object reads and writes shared by the entity stores.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::codec::{self, JSON_CONTENT_TYPE};
use crate::context::CallContext;
use crate::error::DocumentError;
use crate::model::IndexEntry;
use crate::storage::ObjectStore;

/// Read and decode the object at `key`.
pub(crate) async fn read_json<S, T>(
    store: &S,
    ctx: &CallContext,
    bucket: &str,
    key: &str,
) -> Result<T, DocumentError>
where
    S: ObjectStore,
    T: DeserializeOwned,
{
    let bytes = ctx.run("get", store.get(bucket, key)).await?;
    codec::decode(bucket, key, &bytes)
}

/// Encode `value` and write it at `key`.
pub(crate) async fn write_json<S, T>(
    store: &S,
    ctx: &CallContext,
    bucket: &str,
    key: &str,
    value: &T,
) -> Result<(), DocumentError>
where
    S: ObjectStore,
    T: Serialize,
{
    let body = codec::encode(bucket, key, value)?;
    ctx.run("put", store.put(bucket, key, body, JSON_CONTENT_TYPE)).await?;
    Ok(())
}

/// Whether an object exists at `key`.
pub(crate) async fn exists<S: ObjectStore>(
    store: &S,
    ctx: &CallContext,
    bucket: &str,
    key: &str,
) -> Result<bool, DocumentError> {
    match ctx.run("stat", store.stat(bucket, key)).await {
        Ok(_) => Ok(true),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Load one entity found by a primary listing.
///
/// A key that disappears between the listing and the read is left out of the
/// page.
pub(crate) async fn load_listed<S, T>(
    store: &S,
    ctx: &CallContext,
    bucket: &str,
    key: String,
) -> Result<Option<T>, DocumentError>
where
    S: ObjectStore,
    T: DeserializeOwned,
{
    match read_json(store, ctx, bucket, &key).await {
        Ok(entity) => Ok(Some(entity)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Follow one pointer found by an index listing.
///
/// `primary_key` maps the pointer's primary id to the primary object key. A
/// dangling pointer is left out of the page with a warning.
pub(crate) async fn load_pointed<S, T>(
    store: &S,
    ctx: &CallContext,
    bucket: &str,
    pointer_key: String,
    primary_key: impl FnOnce(&str) -> String,
) -> Result<Option<T>, DocumentError>
where
    S: ObjectStore,
    T: DeserializeOwned,
{
    let entry: IndexEntry = match read_json(store, ctx, bucket, &pointer_key).await {
        Ok(entry) => entry,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => return Err(err),
    };

    let key = primary_key(&entry.primary_id);
    match read_json(store, ctx, bucket, &key).await {
        Ok(entity) => Ok(Some(entity)),
        Err(err) if err.is_not_found() => {
            warn!(bucket, pointer = %pointer_key, primary = %key, "skipping dangling index entry");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
