//! Post documents.
//!
//! Posts live at `post-{id}` in the posts bucket. Owner, status and every tag
//! get a non-unique pointer; nothing about a post is unique.

use std::collections::BTreeSet;

use blobdoc_shared::DocumentSettings;
use blobdoc_shared::types::{PageRequest, PageResponse, PostId, UserId};
use chrono::Utc;
use tracing::{debug, info};

use crate::context::CallContext;
use crate::error::DocumentError;
use crate::index::keys::{pointer_key, pointer_prefix};
use crate::index::{Dimension, IndexManager};
use crate::model::{NewPost, Post, PostStatus};
use crate::pagination::{TotalHint, paginate};
use crate::storage::ObjectStore;

use super::counter::Counters;
use super::objects::{exists, load_listed, load_pointed, read_json, write_json};

const PRIMARY_PREFIX: &str = "post-";
const COUNTER: &str = "posts";

/// Key of the primary object for a post id.
#[must_use]
pub fn primary_key(id: &str) -> String {
    format!("{PRIMARY_PREFIX}{id}")
}

/// CRUD and secondary listings over post documents.
#[derive(Debug)]
pub struct PostRepository<'a, S> {
    store: &'a S,
    bucket: &'a str,
    settings: DocumentSettings,
}

impl<'a, S: ObjectStore> PostRepository<'a, S> {
    pub(crate) const fn new(store: &'a S, bucket: &'a str, settings: DocumentSettings) -> Self {
        Self {
            store,
            bucket,
            settings,
        }
    }

    fn index(&self) -> IndexManager<'a, S> {
        IndexManager::new(self.store)
    }

    fn counters(&self) -> Counters<'a, S> {
        Counters::new(self.store, self.bucket)
    }

    /// Creates a post with a fresh id.
    ///
    /// The primary object is written before the owner, status and tag
    /// pointers. A failure part way leaves the post missing from the listings
    /// whose pointers were not written.
    ///
    /// # Errors
    ///
    /// Returns an error if any store call fails.
    pub async fn create(&self, ctx: &CallContext, input: NewPost) -> Result<Post, DocumentError> {
        let now = Utc::now();
        let post = Post {
            id: PostId::new(),
            user_id: input.user_id,
            title: input.title,
            content: input.content,
            summary: input.summary,
            status: input.status,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        let id = post.id.to_string();

        write_json(self.store, ctx, self.bucket, &primary_key(&id), &post).await?;

        let owned = owned_keys(&post);
        let index = self.index();
        for key in &owned {
            index.create_index(ctx, self.bucket, key, &id).await?;
        }
        if self.settings.index_cleanup {
            index.record_owned(ctx, self.bucket, &id, &owned).await?;
        }
        if self.settings.counted_totals {
            self.counters().increment(ctx, COUNTER).await;
        }

        info!(post_id = %post.id, user_id = %post.user_id, "post created");
        Ok(post)
    }

    /// Gets a post by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent or `CorruptObject` if undecodable.
    pub async fn get(&self, ctx: &CallContext, id: PostId) -> Result<Post, DocumentError> {
        read_json(self.store, ctx, self.bucket, &primary_key(&id.to_string())).await
    }

    /// Overwrites a stored post.
    ///
    /// The owner and `created_at` are kept from the stored copy. After the
    /// primary write, pointers for a changed status or removed tags are deleted,
    /// then every pointer the post should have is written if missing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the post does not exist, or any store error.
    pub async fn update(&self, ctx: &CallContext, post: Post) -> Result<Post, DocumentError> {
        let current = self.get(ctx, post.id).await?;
        let id = post.id.to_string();

        let updated = Post {
            user_id: current.user_id,
            created_at: current.created_at,
            updated_at: Utc::now(),
            ..post
        };
        write_json(self.store, ctx, self.bucket, &primary_key(&id), &updated).await?;

        let before: BTreeSet<String> = owned_keys(&current).into_iter().collect();
        let after: BTreeSet<String> = owned_keys(&updated).into_iter().collect();
        let index = self.index();
        for key in before.difference(&after) {
            index.delete_index(ctx, self.bucket, key).await?;
        }
        // Every current pointer, so a retried update repairs missing ones.
        for key in &after {
            index.create_index(ctx, self.bucket, key, &id).await?;
        }
        if self.settings.index_cleanup && before != after {
            let owned: Vec<String> = after.into_iter().collect();
            index.record_owned(ctx, self.bucket, &id, &owned).await?;
        }

        info!(post_id = %id, "post updated");
        Ok(updated)
    }

    /// Lists all posts in key order.
    ///
    /// # Errors
    ///
    /// Returns listing errors and undecodable posts. Cancellation returns the
    /// partial page.
    pub async fn list(
        &self,
        ctx: &CallContext,
        request: PageRequest,
    ) -> Result<PageResponse<Post>, DocumentError> {
        let hint = if self.settings.counted_totals {
            TotalHint::Known(self.counters().read(ctx, COUNTER).await?)
        } else {
            TotalHint::Scan
        };
        let (store, bucket) = (self.store, self.bucket);
        paginate(store, ctx, bucket, PRIMARY_PREFIX, request, hint, |key| {
            load_listed(store, ctx, bucket, key)
        })
        .await
    }

    /// Lists posts written by `user_id`.
    ///
    /// # Errors
    ///
    /// Same as [`PostRepository::list`].
    pub async fn list_by_owner(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        request: PageRequest,
    ) -> Result<PageResponse<Post>, DocumentError> {
        self.list_by(ctx, Dimension::Owner, &user_id.to_string(), request)
            .await
    }

    /// Lists posts with `status`.
    ///
    /// # Errors
    ///
    /// Same as [`PostRepository::list`].
    pub async fn list_by_status(
        &self,
        ctx: &CallContext,
        status: PostStatus,
        request: PageRequest,
    ) -> Result<PageResponse<Post>, DocumentError> {
        self.list_by(ctx, Dimension::Status, status.as_str(), request)
            .await
    }

    /// Lists posts carrying `tag`.
    ///
    /// # Errors
    ///
    /// Same as [`PostRepository::list`].
    pub async fn list_by_tag(
        &self,
        ctx: &CallContext,
        tag: &str,
        request: PageRequest,
    ) -> Result<PageResponse<Post>, DocumentError> {
        self.list_by(ctx, Dimension::Tag, tag, request).await
    }

    // The total counts pointers, including dangling ones that are then left
    // out of the page.
    async fn list_by(
        &self,
        ctx: &CallContext,
        dimension: Dimension,
        value: &str,
        request: PageRequest,
    ) -> Result<PageResponse<Post>, DocumentError> {
        let prefix = pointer_prefix(dimension, value);
        let (store, bucket) = (self.store, self.bucket);
        paginate(store, ctx, bucket, &prefix, request, TotalHint::Scan, |key| {
            load_pointed(store, ctx, bucket, key, primary_key)
        })
        .await
    }

    /// Deletes the primary object. Succeeds if the post is already gone.
    ///
    /// Owner, status and tag pointers stay behind unless index cleanup is on.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    pub async fn delete(&self, ctx: &CallContext, id: PostId) -> Result<(), DocumentError> {
        let id = id.to_string();
        let key = primary_key(&id);
        let existed = if self.settings.counted_totals {
            exists(self.store, ctx, self.bucket, &key).await?
        } else {
            false
        };

        ctx.run("delete", self.store.delete(self.bucket, &key)).await?;

        if self.settings.index_cleanup {
            let released = self.index().release_owned(ctx, self.bucket, &id).await;
            debug!(post_id = %id, released, "owned index entries removed");
        }
        if existed {
            self.counters().decrement(ctx, COUNTER).await;
        }

        info!(post_id = %id, "post deleted");
        Ok(())
    }
}

fn owned_keys(post: &Post) -> Vec<String> {
    let id = post.id.to_string();
    let tags: BTreeSet<&str> = post.tags.iter().map(String::as_str).collect();

    let mut keys = vec![
        pointer_key(Dimension::Owner, &post.user_id.to_string(), &id),
        pointer_key(Dimension::Status, post.status.as_str(), &id),
    ];
    keys.extend(
        tags.into_iter()
            .map(|tag| pointer_key(Dimension::Tag, tag, &id)),
    );
    keys
}
