//! Writer module for the reindex pipeline.
//!
//! Accumulates documents into fixed-size batches and flushes each batch to
//! the search engine as a single bulk request.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::errors::PipelineError;
use reindexer_repository::SearchEngineClient;
use reindexer_shared::PersonDocument;

/// Configuration for the bulk index writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Number of documents per batch.
    pub batch_size: usize,
    /// Bound on each bulk call.
    pub timeout: Duration,
    /// How many times a transient flush failure is retried before it
    /// surfaces as a stage failure.
    pub max_retries: u32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

/// Writer that indexes documents into the search engine in bounded batches.
///
/// The writer never buffers more than one batch: when `accept` fills the
/// batch, it is flushed before `accept` returns, and a flush completes
/// (success or failure) before further documents accumulate. Each batch is
/// flushed exactly once, never split or merged.
///
/// Failure policy: any per-document rejection fails the whole batch; there
/// is no partial-success continuation. Only a transient call failure
/// (timeout, connection) is retried, a bounded number of times.
pub struct BulkIndexWriter {
    client: Arc<dyn SearchEngineClient>,
    index: String,
    config: WriterConfig,
    pending: Vec<PersonDocument>,
    batches_flushed: usize,
    documents_indexed: usize,
    closed: bool,
}

impl BulkIndexWriter {
    /// Create a writer targeting the given physical index.
    pub fn new(client: Arc<dyn SearchEngineClient>, index: impl Into<String>) -> Self {
        Self::with_config(client, index, WriterConfig::default())
    }

    /// Create a writer with custom configuration.
    pub fn with_config(
        client: Arc<dyn SearchEngineClient>,
        index: impl Into<String>,
        config: WriterConfig,
    ) -> Self {
        let capacity = config.batch_size;
        Self {
            client,
            index: index.into(),
            config,
            pending: Vec::with_capacity(capacity),
            batches_flushed: 0,
            documents_indexed: 0,
            closed: false,
        }
    }

    /// Append a document to the current batch, flushing when full.
    pub async fn accept(&mut self, document: PersonDocument) -> Result<(), PipelineError> {
        if self.closed {
            return Err(PipelineError::config("bulk writer already closed"));
        }

        self.pending.push(document);
        if self.pending.len() >= self.config.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush any partial batch immediately.
    #[instrument(skip(self), fields(index = %self.index))]
    pub async fn flush(&mut self) -> Result<(), PipelineError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let batch: Vec<PersonDocument> = self.pending.drain(..).collect();
        let count = batch.len();
        debug!(count = count, "Flushing batch to search index");

        let report = self.send_with_retry(&batch).await?;
        if !report.is_success() {
            return Err(PipelineError::BulkWrite {
                total: report.total,
                failures: report.failures,
            });
        }

        self.batches_flushed += 1;
        self.documents_indexed += count;
        debug!(
            count = count,
            batches = self.batches_flushed,
            "Batch indexed"
        );
        Ok(())
    }

    /// Flush the remainder and release the writer.
    ///
    /// Safe to call more than once; only the first call flushes. Invoked on
    /// both normal completion and error propagation from an earlier stage.
    pub async fn close(&mut self) -> Result<(), PipelineError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.flush().await;
        info!(
            batches = self.batches_flushed,
            documents = self.documents_indexed,
            "Bulk writer closed"
        );
        result
    }

    /// Number of batches flushed so far.
    pub fn batches_flushed(&self) -> usize {
        self.batches_flushed
    }

    /// Number of documents the engine has accepted so far.
    pub fn documents_indexed(&self) -> usize {
        self.documents_indexed
    }

    /// Send one batch, retrying bounded times on transient call failures.
    async fn send_with_retry(
        &self,
        batch: &[PersonDocument],
    ) -> Result<reindexer_repository::BulkReport, PipelineError> {
        let mut attempt = 0;
        loop {
            match self
                .client
                .bulk_write(&self.index, batch, self.config.timeout)
                .await
            {
                Ok(report) => return Ok(report),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        error = %e,
                        attempt = attempt,
                        max = self.config.max_retries,
                        "Transient bulk failure, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
