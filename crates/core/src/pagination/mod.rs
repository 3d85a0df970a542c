//! Offset/limit pagination over prefix listings.
//!
//! The store only lists keys in order, so every page walks the prefix from the
//! start. Page `n` costs `O(offset + page_size)` listing work plus `page_size`
//! reads; counting everything under the prefix costs a full scan unless a
//! known total is supplied.

mod engine;

#[cfg(test)]
mod engine_props;

pub use engine::{TotalHint, paginate};
