//! Person document type for the search index.
//!
//! This module defines the document structure that is indexed in the search
//! engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document representation of a person in the search index.
///
/// The document is keyed by `id` and owned exclusively by the bulk writer
/// from the moment the processor emits it until the batch containing it has
/// been flushed.
///
/// # Fields
///
/// - `id`: Unique identifier, becomes the engine document id
/// - `first_name`: First name (search field)
/// - `last_name`: Last name (search field)
/// - `indexed_at`: Timestamp when the document was built for indexing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonDocument {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub indexed_at: DateTime<Utc>,
}

impl PersonDocument {
    /// Create a new document stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            indexed_at: Utc::now(),
        }
    }
}
