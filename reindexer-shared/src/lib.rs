//! # Reindexer Shared
//!
//! Shared types and data structures for the people reindexer system.

pub mod types;

pub use types::{PersonDocument, PersonRecord};
