//! Shared value types for the reindex pipeline.

mod person_document;
mod person_record;

pub use person_document::PersonDocument;
pub use person_record::PersonRecord;
