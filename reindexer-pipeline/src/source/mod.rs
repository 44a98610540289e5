//! Source module for the reindex pipeline.
//!
//! Provides the pull-based record source seam and the CSV implementation.

mod csv_source;

pub use csv_source::CsvRecordSource;

use crate::errors::PipelineError;
use reindexer_shared::PersonRecord;

/// A lazy, finite source of person records.
///
/// Implementations pull one record at a time; `Ok(None)` signals
/// end-of-stream. The same seam serves a flat file or a database cursor,
/// so the populate stage never knows where records come from.
pub trait RecordSource: Send {
    /// Pull the next record, or `None` at end-of-stream.
    ///
    /// # Errors
    ///
    /// * `PipelineError::SourceUnavailable` - the stream cannot be opened
    ///   or read
    /// * `PipelineError::MalformedRecord` - a row exists but cannot be
    ///   parsed into a record
    fn next_record(&mut self) -> Result<Option<PersonRecord>, PipelineError>;
}

/// In-memory record source, mainly for tests and small fixed corpora.
pub struct VecRecordSource {
    records: std::vec::IntoIter<PersonRecord>,
}

impl VecRecordSource {
    /// Create a source over a fixed set of records.
    pub fn new(records: Vec<PersonRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl RecordSource for VecRecordSource {
    fn next_record(&mut self) -> Result<Option<PersonRecord>, PipelineError> {
        Ok(self.records.next())
    }
}
