//! Denormalized object counts.
//!
//! A counter is a plain object updated by read-modify-write. Two concurrent
//! updates can lose one increment, so a counted total may drift from the true
//! count until it is rebuilt with [`Counters::reset`].

use tracing::{debug, warn};

use crate::context::CallContext;
use crate::error::DocumentError;
use crate::model::Counter;
use crate::storage::ObjectStore;

use super::objects::{read_json, write_json};

/// Counter objects in one bucket.
#[derive(Debug)]
pub struct Counters<'a, S> {
    store: &'a S,
    bucket: &'a str,
}

impl<'a, S: ObjectStore> Counters<'a, S> {
    /// Counters stored in `bucket`.
    #[must_use]
    pub const fn new(store: &'a S, bucket: &'a str) -> Self {
        Self { store, bucket }
    }

    /// Key of the counter for `kind`.
    #[must_use]
    pub fn key(kind: &str) -> String {
        format!("counters/{kind}.json")
    }

    /// Current count; zero when no counter exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter cannot be read or decoded.
    pub async fn read(&self, ctx: &CallContext, kind: &str) -> Result<u64, DocumentError> {
        match read_json::<_, Counter>(self.store, ctx, self.bucket, &Self::key(kind)).await {
            Ok(counter) => Ok(counter.count),
            Err(err) if err.is_not_found() => Ok(0),
            Err(err) => Err(err),
        }
    }

    /// Overwrite the count for `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter cannot be written.
    pub async fn reset(
        &self,
        ctx: &CallContext,
        kind: &str,
        count: u64,
    ) -> Result<(), DocumentError> {
        let counter = Counter { count };
        write_json(self.store, ctx, self.bucket, &Self::key(kind), &counter).await
    }

    /// Add one to the count for `kind`.
    pub async fn increment(&self, ctx: &CallContext, kind: &str) {
        self.adjust(ctx, kind, true).await;
    }

    /// Subtract one from the count for `kind`, stopping at zero.
    pub async fn decrement(&self, ctx: &CallContext, kind: &str) {
        self.adjust(ctx, kind, false).await;
    }

    // A failed counter update leaves the entity write in place; the counter
    // is only a listing hint.
    async fn adjust(&self, ctx: &CallContext, kind: &str, up: bool) {
        let result = async {
            let count = self.read(ctx, kind).await?;
            let count = if up {
                count.saturating_add(1)
            } else {
                count.saturating_sub(1)
            };
            self.reset(ctx, kind, count).await?;
            Ok::<_, DocumentError>(count)
        }
        .await;

        match result {
            Ok(count) => debug!(bucket = self.bucket, kind, count, "counter updated"),
            Err(err) => warn!(bucket = self.bucket, kind, error = %err, "counter update failed"),
        }
    }
}
