//! Shared types, errors, and configuration for Blobdoc.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Pagination request and envelope types for list operations
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, BucketSettings, DocumentSettings, StoreSettings};
pub use error::{AppError, AppResult, ErrorBody};
