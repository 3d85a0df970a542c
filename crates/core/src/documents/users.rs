//! User documents.
//!
//! Users live at `user-{id}` in the users bucket, with unique username and
//! email pointers next to them.

use blobdoc_shared::DocumentSettings;
use blobdoc_shared::types::{PageRequest, PageResponse, UserId};
use chrono::Utc;
use tracing::{debug, info};

use crate::context::CallContext;
use crate::error::DocumentError;
use crate::index::keys::unique_key;
use crate::index::{Dimension, IndexManager};
use crate::model::{NewUser, User};
use crate::pagination::{TotalHint, paginate};
use crate::storage::ObjectStore;

use super::counter::Counters;
use super::objects::{exists, load_listed, read_json, write_json};

const PRIMARY_PREFIX: &str = "user-";
const COUNTER: &str = "users";

/// Key of the primary object for a user id.
#[must_use]
pub fn primary_key(id: &str) -> String {
    format!("{PRIMARY_PREFIX}{id}")
}

/// CRUD over user documents.
#[derive(Debug)]
pub struct UserRepository<'a, S> {
    store: &'a S,
    bucket: &'a str,
    settings: DocumentSettings,
}

impl<'a, S: ObjectStore> UserRepository<'a, S> {
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

    /// Creates a user with a fresh id.
    ///
    /// Username and email are checked before anything is written. The primary
    /// object is written first, then the username pointer, then the email
    /// pointer. A failure after the primary write leaves the user stored but
    /// unreachable by the missing pointers.
    ///
    /// # Errors
    ///
    /// Returns `Conflict("username already exists")` or
    /// `Conflict("email already exists")` if a value is taken at check time.
    pub async fn create(&self, ctx: &CallContext, input: NewUser) -> Result<User, DocumentError> {
        let index = self.index();
        index
            .ensure_available(ctx, self.bucket, Dimension::Username, &input.username, None)
            .await?;
        index
            .ensure_available(ctx, self.bucket, Dimension::Email, &input.email, None)
            .await?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: input.username,
            email: input.email,
            password_hash: input.password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role,
            avatar: input.avatar,
            created_at: now,
            updated_at: now,
        };
        let id = user.id.to_string();

        write_json(self.store, ctx, self.bucket, &primary_key(&id), &user).await?;

        let owned = owned_keys(&user);
        for key in &owned {
            index.create_index(ctx, self.bucket, key, &id).await?;
        }
        if self.settings.index_cleanup {
            index.record_owned(ctx, self.bucket, &id, &owned).await?;
        }
        if self.settings.counted_totals {
            self.counters().increment(ctx, COUNTER).await;
        }

        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Gets a user by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent or `CorruptObject` if undecodable.
    pub async fn get(&self, ctx: &CallContext, id: UserId) -> Result<User, DocumentError> {
        read_json(self.store, ctx, self.bucket, &primary_key(&id.to_string())).await
    }

    /// Gets a user through the username pointer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the pointer is missing or points at a deleted user.
    pub async fn get_by_username(
        &self,
        ctx: &CallContext,
        username: &str,
    ) -> Result<User, DocumentError> {
        self.get_by_unique(ctx, Dimension::Username, username).await
    }

    /// Gets a user through the email pointer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the pointer is missing or points at a deleted user.
    pub async fn get_by_email(
        &self,
        ctx: &CallContext,
        email: &str,
    ) -> Result<User, DocumentError> {
        self.get_by_unique(ctx, Dimension::Email, email).await
    }

    async fn get_by_unique(
        &self,
        ctx: &CallContext,
        dimension: Dimension,
        value: &str,
    ) -> Result<User, DocumentError> {
        let id = self
            .index()
            .resolve_index(ctx, self.bucket, &unique_key(dimension, value))
            .await?;
        read_json(self.store, ctx, self.bucket, &primary_key(&id)).await
    }

    /// Overwrites a stored user.
    ///
    /// `created_at` is kept from the stored copy and `updated_at` is set to now.
    /// When the username or email changes, the new value is checked first, then
    /// the primary object is written, then for each changed value the old
    /// pointer is deleted and the new one created. A failure between those two
    /// steps leaves the user unreachable by either value. Pointers for values
    /// that did not change are rewritten if missing, so repeating the update
    /// repairs that state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist, or `Conflict` if a new
    /// value is held by another user at check time.
    pub async fn update(&self, ctx: &CallContext, user: User) -> Result<User, DocumentError> {
        let current = self.get(ctx, user.id).await?;
        let id = user.id.to_string();
        let index = self.index();

        let values = [
            (Dimension::Username, current.username, user.username.clone()),
            (Dimension::Email, current.email, user.email.clone()),
        ];

        for (dimension, old, new) in &values {
            if old != new {
                index
                    .ensure_available(ctx, self.bucket, *dimension, new, Some(id.as_str()))
                    .await?;
            }
        }

        let updated = User {
            created_at: current.created_at,
            updated_at: Utc::now(),
            ..user
        };
        write_json(self.store, ctx, self.bucket, &primary_key(&id), &updated).await?;

        let mut moved = false;
        for (dimension, old, new) in &values {
            let key = unique_key(*dimension, new);
            if old == new {
                if index.restore_index(ctx, self.bucket, &key, &id).await? {
                    moved = true;
                    debug!(user_id = %id, dimension = dimension.as_str(), "index restored");
                }
                continue;
            }
            index
                .delete_index(ctx, self.bucket, &unique_key(*dimension, old))
                .await?;
            index.create_index(ctx, self.bucket, &key, &id).await?;
            moved = true;
            debug!(user_id = %id, dimension = dimension.as_str(), "index moved");
        }
        if self.settings.index_cleanup && moved {
            index
                .record_owned(ctx, self.bucket, &id, &owned_keys(&updated))
                .await?;
        }

        info!(user_id = %id, "user updated");
        Ok(updated)
    }

    /// Lists users in key order, which is not creation order.
    ///
    /// # Errors
    ///
    /// Returns listing errors and undecodable users. Cancellation returns the
    /// partial page.
    pub async fn list(
        &self,
        ctx: &CallContext,
        request: PageRequest,
    ) -> Result<PageResponse<User>, DocumentError> {
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

    /// Deletes the primary object. Succeeds if the user is already gone.
    ///
    /// Username and email pointers stay behind unless index cleanup is on.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    pub async fn delete(&self, ctx: &CallContext, id: UserId) -> Result<(), DocumentError> {
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
            debug!(user_id = %id, released, "owned index entries removed");
        }
        if existed {
            self.counters().decrement(ctx, COUNTER).await;
        }

        info!(user_id = %id, "user deleted");
        Ok(())
    }
}

fn owned_keys(user: &User) -> Vec<String> {
    vec![
        unique_key(Dimension::Username, &user.username),
        unique_key(Dimension::Email, &user.email),
    ]
}
