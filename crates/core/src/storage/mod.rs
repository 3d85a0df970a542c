//! Object store client.
//!
//! The document layer only needs put/get/list/delete over opaque bytes, keyed by
//! bucket and key. [`OpendalStore`] provides that on top of Apache OpenDAL,
//! [`MemoryStore`] keeps everything in process.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write_with("key", data) │ op.lister_with("dir/").recursive() │
//! │ op.read("key")             │ op.stat("key")                     │
//! │ op.delete("key")           │ op.check()                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No conditional write is used: a put always replaces what is there.

mod client;
mod config;
mod error;
mod memory;
mod service;

pub use client::{ObjectInfo, ObjectStore, ObjectVersion};
pub use config::{StorageProvider, StoreConfig};
pub use error::StorageError;
pub use memory::MemoryStore;
pub use service::OpendalStore;
