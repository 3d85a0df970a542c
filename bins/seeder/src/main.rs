//! Demo data seeder for Blobdoc development.
//!
//! Connects to the configured object store, reports bucket health, and seeds a
//! demo user with two posts and one file. Does nothing if the demo username is
//! already taken.
//!
//! Usage: cargo run --bin seeder

use std::collections::HashMap;

use anyhow::Context;
use bytes::Bytes;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blobdoc_core::DocumentStore;
use blobdoc_core::model::{FileUpload, NewPost, NewUser, PostStatus, User};
use blobdoc_core::storage::{OpendalStore, StoreConfig};
use blobdoc_shared::AppConfig;

const DEMO_USERNAME: &str = "demo";
const DEMO_EMAIL: &str = "demo@blobdoc.dev";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blobdoc=debug,seeder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let store_config = StoreConfig::from_settings(&config.store)?;
    info!(provider = store_config.provider.name(), "connecting to object store");

    let docs = DocumentStore::connect(store_config, config.documents)?;

    let health = docs.health(&docs.context()).await;
    for bucket in &health.buckets {
        info!(bucket = %bucket.name, reachable = bucket.reachable, "bucket probed");
    }
    if !health.is_healthy() {
        anyhow::bail!("object store is not reachable");
    }

    let ctx = docs.context();
    match docs.users().get_by_username(&ctx, DEMO_USERNAME).await {
        Ok(user) => {
            info!(user_id = %user.id, "demo user already exists, skipping");
            return Ok(());
        }
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err.into()),
    }

    let user = seed_user(&docs).await?;
    seed_posts(&docs, &user).await?;
    seed_file(&docs, &user).await?;

    info!("seeding complete");
    Ok(())
}

async fn seed_user(docs: &DocumentStore<OpendalStore>) -> anyhow::Result<User> {
    let input = NewUser {
        first_name: "Demo".to_string(),
        last_name: "User".to_string(),
        ..NewUser::new(
            DEMO_USERNAME,
            DEMO_EMAIL,
            "$argon2id$v=19$m=65536,t=3,p=4$demo_hash",
        )
    };
    let user = docs.users().create(&docs.context(), input).await?;
    info!(user_id = %user.id, "seeded demo user");
    Ok(user)
}

async fn seed_posts(docs: &DocumentStore<OpendalStore>, user: &User) -> anyhow::Result<()> {
    let posts = [
        NewPost {
            user_id: user.id,
            title: "Hello, object store".to_string(),
            content: "Every entity here is a JSON object under a derived key.".to_string(),
            summary: "First post".to_string(),
            status: PostStatus::Published,
            tags: vec!["intro".to_string(), "storage".to_string()],
        },
        NewPost {
            user_id: user.id,
            title: "Indexes without a database".to_string(),
            content: "Secondary lookups are pointer objects.".to_string(),
            summary: "Draft notes".to_string(),
            status: PostStatus::Draft,
            tags: vec!["storage".to_string()],
        },
    ];

    for input in posts {
        let post = docs.posts().create(&docs.context(), input).await?;
        info!(post_id = %post.id, status = post.status.as_str(), "seeded post");
    }
    Ok(())
}

async fn seed_file(docs: &DocumentStore<OpendalStore>, user: &User) -> anyhow::Result<()> {
    let upload = FileUpload {
        user_id: user.id,
        original_name: "welcome.txt".to_string(),
        content_type: "text/plain".to_string(),
        body: Bytes::from_static(b"Welcome to Blobdoc.\n"),
        metadata: HashMap::from([("source".to_string(), "seeder".to_string())]),
    };
    let file = docs.files().upload(&docs.context(), upload).await?;
    info!(file_id = %file.id, path = %file.path, "seeded file");
    Ok(())
}
