//! Index lifecycle module.
//!
//! Administrative index operations as a closed set of tagged operations
//! executed by a single interpreter. Adding a lifecycle action means adding
//! a variant, not a new open-ended type.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::errors::PipelineError;
use reindexer_repository::{SearchEngineClient, SearchError};

/// One administrative action against the search engine.
#[derive(Debug, Clone)]
pub enum LifecycleOp {
    /// Delete an index; success (no-op) when it is already absent.
    DeleteIndexIfExists { index: String },
    /// Create an index with an opaque settings blob.
    ///
    /// Fails with `IndexAlreadyExists` when the index is present; the
    /// caller is responsible for having deleted it first.
    CreateIndex { index: String, settings: Value },
    /// Apply an opaque mapping blob to an existing index.
    PutMapping { index: String, mapping: Value },
    /// Delete every index currently bound to the alias, except `keep`.
    ///
    /// A missing alias is a no-op.
    DeleteAliasedIndices { alias: String, keep: String },
    /// Atomically rebind the alias to the given index.
    SwapAlias { alias: String, index: String },
}

impl LifecycleOp {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeleteIndexIfExists { .. } => "delete_index_if_exists",
            Self::CreateIndex { .. } => "create_index",
            Self::PutMapping { .. } => "put_mapping",
            Self::DeleteAliasedIndices { .. } => "delete_aliased_indices",
            Self::SwapAlias { .. } => "swap_alias",
        }
    }
}

/// Interpreter for lifecycle operations.
pub struct IndexLifecycleManager {
    client: Arc<dyn SearchEngineClient>,
}

impl IndexLifecycleManager {
    /// Create a manager over the given engine client.
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self { client }
    }

    /// Execute one lifecycle operation.
    #[instrument(skip(self, op), fields(op = op.name()))]
    pub async fn execute(&self, op: &LifecycleOp) -> Result<(), PipelineError> {
        match op {
            LifecycleOp::DeleteIndexIfExists { index } => {
                if !self.client.index_exists(index).await? {
                    debug!(index = %index, "Index absent, nothing to delete");
                    return Ok(());
                }
                self.client.delete_index(index).await?;
                info!(index = %index, "Deleted stale index");
                Ok(())
            }
            LifecycleOp::CreateIndex { index, settings } => {
                self.client.create_index(index, settings).await?;
                Ok(())
            }
            LifecycleOp::PutMapping { index, mapping } => {
                self.client.put_mapping(index, mapping).await?;
                Ok(())
            }
            LifecycleOp::DeleteAliasedIndices { alias, keep } => {
                let bound = self.client.indices_for_alias(alias).await?;
                if bound.is_empty() {
                    debug!(alias = %alias, "Alias absent, nothing to delete");
                    return Ok(());
                }
                for index in bound.iter().filter(|index| *index != keep) {
                    match self.client.delete_index(index).await {
                        Ok(()) => info!(index = %index, alias = %alias, "Deleted old aliased index"),
                        // Already gone between resolve and delete.
                        Err(SearchError::IndexNotFound(_)) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                Ok(())
            }
            LifecycleOp::SwapAlias { alias, index } => {
                self.client.swap_alias(alias, index).await?;
                info!(alias = %alias, index = %index, "Alias swapped");
                Ok(())
            }
        }
    }
}
