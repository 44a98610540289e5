//! Record processor implementation.
//!
//! Transforms person records into `PersonDocument` structures for indexing.

use tracing::trace;

use crate::errors::PipelineError;
use reindexer_shared::{PersonDocument, PersonRecord};

/// Processor that transforms source records into search documents.
///
/// The transform is pure and deterministic: no I/O, no state, same record
/// in means same document out (modulo the `indexed_at` stamp). A record
/// that violates a constraint fails with its stream position; the document
/// id is always present.
///
/// Constraints:
/// - `id` must be non-blank (it becomes the engine document id)
/// - at least one of `first_name`/`last_name` must be non-blank
pub struct RecordProcessor;

impl RecordProcessor {
    /// Create a new record processor.
    pub fn new() -> Self {
        Self
    }

    /// Transform one record into one document.
    pub fn process(&self, record: &PersonRecord) -> Result<PersonDocument, PipelineError> {
        let id = record.id.trim();
        if id.is_empty() {
            return Err(PipelineError::malformed(
                record.position,
                "missing required field: id",
            ));
        }

        let first_name = record.first_name.trim();
        let last_name = record.last_name.trim();
        if first_name.is_empty() && last_name.is_empty() {
            return Err(PipelineError::malformed(
                record.position,
                "missing required field: both firstName and lastName are blank",
            ));
        }

        trace!(position = record.position, id = %id, "Transformed record");
        Ok(PersonDocument::new(id, first_name, last_name))
    }
}

impl Default for RecordProcessor {
    fn default() -> Self {
        Self::new()
    }
}
