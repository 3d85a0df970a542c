//! Document operations through the OpenDAL-backed store.

use std::collections::HashMap;

use blobdoc_core::DocumentStore;
use blobdoc_core::context::CallContext;
use blobdoc_core::model::{FileUpload, NewPost, PostStatus};
use blobdoc_core::storage::{OpendalStore, StorageProvider, StoreConfig};
use blobdoc_shared::DocumentSettings;
use blobdoc_shared::types::PageRequest;
use bytes::Bytes;
use rstest::rstest;

mod common;
use common::new_user;

fn connect(provider: StorageProvider) -> DocumentStore<OpendalStore> {
    DocumentStore::connect(StoreConfig::new(provider), DocumentSettings::default())
        .expect("should connect")
}

#[rstest]
#[case::memory(false)]
#[case::local_fs(true)]
#[tokio::test]
async fn test_users_through_connect(#[case] on_disk: bool) {
    let dir = tempfile::tempdir().unwrap();
    let docs = if on_disk {
        connect(StorageProvider::local_fs(dir.path()))
    } else {
        connect(StorageProvider::Memory)
    };
    let ctx = CallContext::new();
    let users = docs.users();
    assert!(docs.health(&ctx).await.is_healthy());

    let mut created = Vec::new();
    for name in ["erin", "alice", "dave", "bob", "carol"] {
        let user = users
            .create(&ctx, new_user(name, &format!("{name}@x.com")))
            .await
            .unwrap();
        created.push(user);
    }

    let page = users.list(&ctx, PageRequest::new(2, 2)).await.unwrap();
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.offset, 2);
    assert_eq!(page.data.len(), 2);

    let mut expected: Vec<String> = created.iter().map(|u| u.id.to_string()).collect();
    expected.sort();
    let listed: Vec<String> = page.data.iter().map(|u| u.id.to_string()).collect();
    assert_eq!(listed, expected[2..4]);

    let bob = users.get_by_username(&ctx, "bob").await.unwrap();
    assert_eq!(bob.email, "bob@x.com");
    assert!(users.get_by_username(&ctx, "zed").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_posts_and_files_on_local_fs() {
    let dir = tempfile::tempdir().unwrap();
    let docs = connect(StorageProvider::local_fs(dir.path()));
    let ctx = CallContext::new();
    let owner = docs
        .users()
        .create(&ctx, new_user("alice", "a@x.com"))
        .await
        .unwrap();

    let post = docs
        .posts()
        .create(
            &ctx,
            NewPost {
                user_id: owner.id,
                title: "On disk".to_string(),
                content: "body".to_string(),
                summary: String::new(),
                status: PostStatus::Published,
                tags: vec!["rust".to_string()],
            },
        )
        .await
        .unwrap();
    let tagged = docs
        .posts()
        .list_by_tag(&ctx, "rust", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(tagged.data, vec![post]);

    let body = Bytes::from_static(b"%PDF-1.4\n%%EOF\n");
    let file = docs
        .files()
        .upload(
            &ctx,
            FileUpload {
                user_id: owner.id,
                original_name: "sample.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                body: body.clone(),
                metadata: HashMap::new(),
            },
        )
        .await
        .unwrap();
    assert!(dir.path().join("files").join(&file.path).is_file());

    let content = docs.files().get_content(&ctx, owner.id, file.id).await.unwrap();
    assert_eq!(content.body, body);
    assert_eq!(content.content_type, "application/pdf");

    let by_type = docs
        .files()
        .list_by_content_type(&ctx, "application/pdf", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(by_type.data, vec![file.clone()]);

    docs.files().delete(&ctx, owner.id, file.id).await.unwrap();
    assert!(!dir.path().join("files").join(&file.path).exists());
}
