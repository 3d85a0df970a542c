//! Document-store emulation for Blobdoc.
//!
//! Turns a flat bucket/key object store into entity CRUD with uniqueness
//! checks, secondary lookups and paginated listings. There are no
//! transactions and no native indexes underneath: indexes are pointer objects
//! that can drift from the data they describe.
//!
//! # Modules
//!
//! - `storage` - Object store contract, OpenDAL client and in-memory store
//! - `codec` - JSON encoding of stored entities
//! - `index` - Pointer objects for secondary lookups
//! - `pagination` - Single-pass offset/limit listing
//! - `documents` - User, post and file repositories
//! - `context` - Per-call deadline and cancellation

pub mod codec;
pub mod context;
pub mod documents;
pub mod error;
pub mod index;
pub mod model;
pub mod pagination;
pub mod storage;

pub use context::CallContext;
pub use documents::{DocumentStore, HealthReport};
pub use error::DocumentError;
