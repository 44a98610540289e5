//! Error types for the reindex pipeline.

use reindexer_repository::{BulkItemFailure, SearchError};
use thiserror::Error;

/// Errors that can occur in the reindex pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing or invalid required setting; surfaces before any stage runs.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The record stream could not be opened or read.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single record could not be transformed.
    ///
    /// Policy: a malformed record aborts the run. The position and the
    /// violated constraint are carried so the operator can fix the source
    /// and re-run.
    #[error("Malformed record at position {position}: {reason}")]
    MalformedRecord { position: u64, reason: String },

    /// Error from the search engine.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// One or more documents were rejected in a bulk flush.
    #[error("Bulk write failed: {} of {total} documents rejected", failures.len())]
    BulkWrite {
        total: usize,
        failures: Vec<BulkItemFailure>,
    },

    /// The run was aborted by an external signal.
    #[error("Run cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a source-unavailable error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create a malformed-record error.
    pub fn malformed(position: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            position,
            reason: reason.into(),
        }
    }
}
