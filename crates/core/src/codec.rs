//! Entity codec: JSON bytes in, typed entities out.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DocumentError;

/// Content type written with every JSON object.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Serialize an entity for storage at `bucket`/`key`.
///
/// # Errors
///
/// Returns [`DocumentError::Encode`] if serialization fails.
pub fn encode<T: Serialize>(bucket: &str, key: &str, value: &T) -> Result<Bytes, DocumentError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|source| DocumentError::Encode {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        })
}

/// Deserialize an entity read from `bucket`/`key`.
///
/// Unknown fields are ignored. Nothing is substituted for a payload that does not
/// parse.
///
/// # Errors
///
/// Returns [`DocumentError::CorruptObject`] if the payload is not a valid `T`.
pub fn decode<T: DeserializeOwned>(
    bucket: &str,
    key: &str,
    bytes: &[u8],
) -> Result<T, DocumentError> {
    serde_json::from_slice(bytes).map_err(|source| DocumentError::CorruptObject {
        bucket: bucket.to_string(),
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "codec_props.rs"]
mod props;
