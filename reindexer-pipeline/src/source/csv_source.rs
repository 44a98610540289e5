//! CSV record source implementation.
//!
//! Reads person records from a comma-delimited file with one header line,
//! columns `id,firstName,lastName`.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecordsIntoIter};
use tracing::{debug, info};

use crate::errors::PipelineError;
use crate::source::RecordSource;
use reindexer_shared::PersonRecord;

/// Number of columns a person row must have.
const EXPECTED_FIELDS: usize = 3;

/// Record source backed by a CSV file.
///
/// The file is opened lazily on the first pull, so an unreadable path
/// surfaces as a populate-stage failure rather than a wiring failure.
/// Positions are 1-based over data rows; the header line does not count.
pub struct CsvRecordSource {
    path: PathBuf,
    rows: Option<StringRecordsIntoIter<File>>,
    position: u64,
}

impl CsvRecordSource {
    /// Create a source for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rows: None,
            position: 0,
        }
    }

    /// The file this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&mut self) -> Result<(), PipelineError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| {
                PipelineError::source(format!("cannot open {}: {}", self.path.display(), e))
            })?;

        info!(path = %self.path.display(), "Opened CSV record source");
        self.rows = Some(reader.into_records());
        Ok(())
    }
}

impl RecordSource for CsvRecordSource {
    fn next_record(&mut self) -> Result<Option<PersonRecord>, PipelineError> {
        if self.rows.is_none() {
            self.open()?;
        }

        let rows = self.rows.as_mut().expect("reader opened above");
        let row = match rows.next() {
            None => {
                debug!(records = self.position, "CSV record source exhausted");
                return Ok(None);
            }
            Some(row) => row,
        };

        self.position += 1;
        let position = self.position;

        let row = row.map_err(|e| {
            if e.is_io_error() {
                PipelineError::source(format!("read error in {}: {}", self.path.display(), e))
            } else {
                PipelineError::malformed(position, e.to_string())
            }
        })?;

        if row.len() < EXPECTED_FIELDS {
            return Err(PipelineError::malformed(
                position,
                format!("expected {} fields, found {}", EXPECTED_FIELDS, row.len()),
            ));
        }

        Ok(Some(PersonRecord::new(
            position,
            row.get(0).unwrap_or_default(),
            row.get(1).unwrap_or_default(),
            row.get(2).unwrap_or_default(),
        )))
    }
}
