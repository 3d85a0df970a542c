//! File documents.
//!
//! A file is two objects in the files bucket, both scoped by owner:
//!
//! ```text
//! {userId}/{fileId}.{ext}             content, stored with its content type
//! {userId}/metadata/{fileId}.json     FileMetadata
//! ```
//!
//! Content-type and date pointers store `{userId}/{fileId}` as the primary id.

use std::path::Path;

use blobdoc_shared::DocumentSettings;
use blobdoc_shared::types::{FileId, PageRequest, PageResponse, UserId};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::context::CallContext;
use crate::error::DocumentError;
use crate::index::keys::{pointer_key, pointer_prefix};
use crate::index::{Dimension, IndexManager};
use crate::model::{FileContent, FileMetadata, FileUpload};
use crate::pagination::{TotalHint, paginate};
use crate::storage::ObjectStore;

use super::counter::Counters;
use super::objects::{load_listed, load_pointed, read_json, write_json};

/// Key of the metadata object for a file.
#[must_use]
pub fn metadata_key(user_id: &str, file_id: &str) -> String {
    format!("{}{file_id}.json", metadata_prefix(user_id))
}

fn metadata_prefix(user_id: &str) -> String {
    format!("{user_id}/metadata/")
}

/// Primary id recorded in file pointers.
fn pointer_id(user_id: &str, file_id: &str) -> String {
    format!("{user_id}/{file_id}")
}

/// Map a pointer's primary id back to the metadata key.
fn pointed_metadata_key(primary_id: &str) -> String {
    match primary_id.split_once('/') {
        Some((user_id, file_id)) => metadata_key(user_id, file_id),
        None => primary_id.to_string(),
    }
}

fn counter_kind(user_id: &str) -> String {
    format!("files-{user_id}")
}

/// Stored file name: the id plus the extension of the uploaded name, if any.
fn stored_name(id: FileId, original_name: &str) -> String {
    match Path::new(original_name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{id}.{ext}"),
        _ => id.to_string(),
    }
}

/// Upload, metadata and secondary listings over file documents.
#[derive(Debug)]
pub struct FileRepository<'a, S> {
    store: &'a S,
    bucket: &'a str,
    settings: DocumentSettings,
}

impl<'a, S: ObjectStore> FileRepository<'a, S> {
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

    /// Stores file content and its metadata.
    ///
    /// Writes the content, then the metadata, then the content-type and date
    /// pointers. A failure after the content write leaves an orphaned content
    /// object; nothing is rolled back.
    ///
    /// # Errors
    ///
    /// Returns an error if any store call fails.
    pub async fn upload(
        &self,
        ctx: &CallContext,
        upload: FileUpload,
    ) -> Result<FileMetadata, DocumentError> {
        let id = FileId::new();
        let user_id = upload.user_id.to_string();
        let file_name = stored_name(id, &upload.original_name);
        let path = format!("{user_id}/{file_name}");
        let size = upload.body.len() as u64;

        ctx.run(
            "put",
            self.store.put(self.bucket, &path, upload.body, &upload.content_type),
        )
        .await?;

        let now = Utc::now();
        let file = FileMetadata {
            id,
            user_id: upload.user_id,
            file_name,
            original_name: upload.original_name,
            content_type: upload.content_type,
            size,
            path,
            metadata: upload.metadata,
            created_at: now,
            updated_at: now,
        };
        let file_id = id.to_string();
        write_json(
            self.store,
            ctx,
            self.bucket,
            &metadata_key(&user_id, &file_id),
            &file,
        )
        .await?;

        let primary = pointer_id(&user_id, &file_id);
        let owned = owned_keys(&file);
        let index = self.index();
        for key in &owned {
            index.create_index(ctx, self.bucket, key, &primary).await?;
        }
        if self.settings.index_cleanup {
            index.record_owned(ctx, self.bucket, &primary, &owned).await?;
        }
        if self.settings.counted_totals {
            self.counters().increment(ctx, &counter_kind(&user_id)).await;
        }

        info!(file_id = %file.id, user_id = %file.user_id, size, "file uploaded");
        Ok(file)
    }

    /// Gets a file's metadata.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent or `CorruptObject` if undecodable.
    pub async fn get(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        file_id: FileId,
    ) -> Result<FileMetadata, DocumentError> {
        let key = metadata_key(&user_id.to_string(), &file_id.to_string());
        read_json(self.store, ctx, self.bucket, &key).await
    }

    /// Reads a file's content and the content type it was uploaded with.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the metadata or the content object is missing.
    pub async fn get_content(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        file_id: FileId,
    ) -> Result<FileContent, DocumentError> {
        let file = self.get(ctx, user_id, file_id).await?;
        let body = ctx.run("get", self.store.get(self.bucket, &file.path)).await?;
        Ok(FileContent {
            body,
            content_type: file.content_type,
        })
    }

    /// Overwrites a file's metadata. The content is not touched.
    ///
    /// Only `original_name` and `metadata` are taken from the argument; the
    /// remaining fields describe the stored content and are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file does not exist, or any store error.
    pub async fn update(
        &self,
        ctx: &CallContext,
        file: FileMetadata,
    ) -> Result<FileMetadata, DocumentError> {
        let current = self.get(ctx, file.user_id, file.id).await?;
        let updated = FileMetadata {
            original_name: file.original_name,
            metadata: file.metadata,
            updated_at: Utc::now(),
            ..current
        };
        let key = metadata_key(&updated.user_id.to_string(), &updated.id.to_string());
        write_json(self.store, ctx, self.bucket, &key, &updated).await?;

        info!(file_id = %updated.id, "file metadata updated");
        Ok(updated)
    }

    /// Lists the files owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns listing errors and undecodable metadata. Cancellation returns
    /// the partial page.
    pub async fn list(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        request: PageRequest,
    ) -> Result<PageResponse<FileMetadata>, DocumentError> {
        let user_id = user_id.to_string();
        let hint = if self.settings.counted_totals {
            TotalHint::Known(self.counters().read(ctx, &counter_kind(&user_id)).await?)
        } else {
            TotalHint::Scan
        };
        let prefix = metadata_prefix(&user_id);
        let (store, bucket) = (self.store, self.bucket);
        paginate(store, ctx, bucket, &prefix, request, hint, |key| {
            load_listed(store, ctx, bucket, key)
        })
        .await
    }

    /// Lists files of every owner with `content_type`.
    ///
    /// # Errors
    ///
    /// Same as [`FileRepository::list`].
    pub async fn list_by_content_type(
        &self,
        ctx: &CallContext,
        content_type: &str,
        request: PageRequest,
    ) -> Result<PageResponse<FileMetadata>, DocumentError> {
        self.list_by(ctx, Dimension::ContentType, content_type, request)
            .await
    }

    /// Lists files of every owner created on `date` (UTC).
    ///
    /// # Errors
    ///
    /// Same as [`FileRepository::list`].
    pub async fn list_by_date(
        &self,
        ctx: &CallContext,
        date: NaiveDate,
        request: PageRequest,
    ) -> Result<PageResponse<FileMetadata>, DocumentError> {
        let value = date.format("%Y-%m-%d").to_string();
        self.list_by(ctx, Dimension::Date, &value, request).await
    }

    async fn list_by(
        &self,
        ctx: &CallContext,
        dimension: Dimension,
        value: &str,
        request: PageRequest,
    ) -> Result<PageResponse<FileMetadata>, DocumentError> {
        let prefix = pointer_prefix(dimension, value);
        let (store, bucket) = (self.store, self.bucket);
        paginate(store, ctx, bucket, &prefix, request, TotalHint::Scan, |key| {
            load_pointed(store, ctx, bucket, key, pointed_metadata_key)
        })
        .await
    }

    /// Deletes a file's content and metadata. Succeeds if the file is already
    /// gone.
    ///
    /// The content object is deleted first. Content-type and date pointers
    /// stay behind unless index cleanup is on.
    ///
    /// # Errors
    ///
    /// Returns an error if a store call fails or the metadata is undecodable.
    pub async fn delete(
        &self,
        ctx: &CallContext,
        user_id: UserId,
        file_id: FileId,
    ) -> Result<(), DocumentError> {
        let user_id = user_id.to_string();
        let file_id = file_id.to_string();
        let key = metadata_key(&user_id, &file_id);

        let file: FileMetadata = match read_json(self.store, ctx, self.bucket, &key).await {
            Ok(file) => file,
            Err(err) if err.is_not_found() => {
                debug!(file_id = %file_id, "file already deleted");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        ctx.run("delete", self.store.delete(self.bucket, &file.path)).await?;
        ctx.run("delete", self.store.delete(self.bucket, &key)).await?;

        if self.settings.index_cleanup {
            let primary = pointer_id(&user_id, &file_id);
            let released = self.index().release_owned(ctx, self.bucket, &primary).await;
            debug!(file_id = %file_id, released, "owned index entries removed");
        }
        if self.settings.counted_totals {
            self.counters().decrement(ctx, &counter_kind(&user_id)).await;
        }

        info!(file_id = %file_id, user_id = %user_id, "file deleted");
        Ok(())
    }
}

fn owned_keys(file: &FileMetadata) -> Vec<String> {
    let primary = pointer_id(&file.user_id.to_string(), &file.id.to_string());
    let date = file.created_at.format("%Y-%m-%d").to_string();
    vec![
        pointer_key(Dimension::ContentType, &file.content_type, &primary),
        pointer_key(Dimension::Date, &date, &primary),
    ]
}
