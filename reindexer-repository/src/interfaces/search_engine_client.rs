//! Search engine client trait definition.
//!
//! This module defines the abstract interface for search engine operations,
//! allowing for different backend implementations (OpenSearch, mock, etc.).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;
use reindexer_shared::PersonDocument;

/// Per-document failure inside a bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// The document id the engine rejected.
    pub id: String,
    /// The engine's reason for rejecting it.
    pub reason: String,
}

/// Outcome of one bulk request, enumerating per-document failures.
///
/// A transport-level error (connection refused, timeout) is reported as
/// `Err(SearchError)` by the client instead; a `BulkReport` always means the
/// request itself completed and the engine answered per document.
#[derive(Debug, Clone, Default)]
pub struct BulkReport {
    /// Number of documents in the request.
    pub total: usize,
    /// Documents the engine rejected, if any.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkReport {
    /// Create a report for a fully successful bulk request.
    pub fn success(total: usize) -> Self {
        Self {
            total,
            failures: Vec::new(),
        }
    }

    /// Whether every document in the request was accepted.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Abstract interface for search engine operations.
///
/// This trait covers the administrative calls (index create/delete, mapping,
/// alias) and the bulk-write call the reindex pipeline needs. Implementations
/// can be swapped for different backends (OpenSearch, mock, etc.) enabling
/// easy testing and potential future migrations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, SearchError>` for consistent error handling.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Check whether an index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Create an index with the given settings blob.
    ///
    /// The settings document is opaque to the pipeline; it is passed to the
    /// engine as-is.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was created
    /// * `Err(SearchError::IndexAlreadyExists)` - If the index already exists;
    ///   this call never silently overwrites an existing index
    async fn create_index(&self, index: &str, settings: &Value) -> Result<(), SearchError>;

    /// Delete an index.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was deleted
    /// * `Err(SearchError::IndexNotFound)` - If the index does not exist
    async fn delete_index(&self, index: &str) -> Result<(), SearchError>;

    /// Apply a mapping document to an existing index.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the mapping was applied
    /// * `Err(SearchError::IndexNotFound)` - If the index does not exist
    /// * `Err(SearchError::InvalidMapping)` - If the engine rejects the schema
    async fn put_mapping(&self, index: &str, mapping: &Value) -> Result<(), SearchError>;

    /// Resolve an alias to the indices currently bound to it.
    ///
    /// An alias that does not exist resolves to an empty list, not an error.
    async fn indices_for_alias(&self, alias: &str) -> Result<Vec<String>, SearchError>;

    /// Rebind `alias` to `index` in a single engine-atomic call.
    ///
    /// Implementations must not decompose this into separate unlink/link
    /// calls: a reader resolving the alias never observes it absent or
    /// pointing at neither index.
    async fn swap_alias(&self, alias: &str, index: &str) -> Result<(), SearchError>;

    /// Write a batch of documents to `index` as one bulk request.
    ///
    /// # Arguments
    ///
    /// * `index` - The physical index name to write into
    /// * `documents` - The batch, written in order
    /// * `timeout` - Bound on the bulk call itself; exceeding it yields
    ///   `Err(SearchError::Timeout)`
    ///
    /// # Returns
    ///
    /// * `Ok(BulkReport)` - The engine answered; the report enumerates any
    ///   per-document rejections
    /// * `Err(SearchError)` - The call itself failed (transport, timeout)
    async fn bulk_write(
        &self,
        index: &str,
        documents: &[PersonDocument],
        timeout: Duration,
    ) -> Result<BulkReport, SearchError>;

    /// Check if the search engine is healthy and reachable.
    async fn health_check(&self) -> Result<bool, SearchError>;
}
