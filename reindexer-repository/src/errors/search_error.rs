//! Search engine error types.
//!
//! This module defines the error types that can occur during search engine
//! operations, administrative and bulk alike.

use thiserror::Error;

/// Errors that can occur during search engine operations.
#[derive(Error, Debug, Clone)]
pub enum SearchError {
    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Index creation was attempted while the index already exists.
    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    /// The targeted index does not exist.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// The engine rejected the mapping document.
    #[error("Invalid mapping for index {index}: {reason}")]
    InvalidMapping { index: String, reason: String },

    /// A call did not complete within its configured timeout.
    ///
    /// Transient by nature, as opposed to an engine-side rejection.
    #[error("Timeout after {0}")]
    Timeout(String),

    /// An administrative call failed.
    #[error("Admin error: {0}")]
    AdminError(String),

    /// Failed to parse a response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index-already-exists error.
    pub fn index_already_exists(index: impl Into<String>) -> Self {
        Self::IndexAlreadyExists(index.into())
    }

    /// Create an index-not-found error.
    pub fn index_not_found(index: impl Into<String>) -> Self {
        Self::IndexNotFound(index.into())
    }

    /// Create an invalid-mapping error.
    pub fn invalid_mapping(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMapping {
            index: index.into(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an admin error.
    pub fn admin(msg: impl Into<String>) -> Self {
        Self::AdminError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Whether the error is transient and worth a bounded local retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ConnectionError(_))
    }
}
