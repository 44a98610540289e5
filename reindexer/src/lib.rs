//! # Reindexer
//!
//! Main library for the people search reindexer.
//!
//! This crate provides the entry point and configuration for running a
//! full reindex: stream person records from a CSV file into a fresh
//! OpenSearch index and promote it atomically behind the stable alias.

pub mod config;

pub use config::{Dependencies, ReindexConfig};

use thiserror::Error;

/// Errors that can occur during reindexer initialization or execution.
#[derive(Error, Debug)]
pub enum ReindexerError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] reindexer_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] reindexer_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReindexerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
