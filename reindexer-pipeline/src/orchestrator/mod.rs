//! Orchestrator module for the reindex pipeline.
//!
//! Sequences the lifecycle operations and the streaming population step
//! into one ordered run, deciding continue-vs-abort on each stage's
//! outcome.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{error, info, instrument};

use crate::errors::PipelineError;
use crate::lifecycle::{IndexLifecycleManager, LifecycleOp};
use crate::processor::RecordProcessor;
use crate::source::RecordSource;
use crate::writer::{BulkIndexWriter, WriterConfig};
use reindexer_repository::opensearch::{next_version_after, versioned_index_name, IndexConfig};
use reindexer_repository::SearchEngineClient;

/// One ordered unit of the reindex state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DeleteStaleIndex,
    CreateIndex,
    PutMapping,
    Populate,
    DeleteOldIndex,
    SwapAlias,
}

impl Stage {
    /// Stable name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeleteStaleIndex => "delete_stale_index",
            Self::CreateIndex => "create_index",
            Self::PutMapping => "put_mapping",
            Self::Populate => "populate",
            Self::DeleteOldIndex => "delete_old_index",
            Self::SwapAlias => "swap_alias",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one completed stage, kept as run history.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: Stage,
    /// Cause of failure; `None` means the stage succeeded.
    pub error: Option<String>,
}

/// Terminal status of a run.
#[derive(Debug)]
pub enum RunStatus {
    Completed,
    Failed { stage: Stage, cause: PipelineError },
}

/// The whole orchestrated execution.
///
/// Immutable history once finished: start time, ordered stage results,
/// terminal status.
#[derive(Debug)]
pub struct JobRun {
    pub started_at: DateTime<Utc>,
    pub stages: Vec<StageResult>,
    pub status: RunStatus,
    /// The physical index this run targeted.
    pub target_index: String,
}

impl JobRun {
    /// Whether the run reached `DONE`.
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }
}

/// Configuration for one reindex run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Alias plus base version for the physical index naming scheme.
    pub index: IndexConfig,
    /// Opaque settings blob for index creation.
    pub settings: Value,
    /// Opaque mapping blob.
    pub mapping: Value,
    /// Documents per bulk batch.
    pub batch_size: usize,
    /// Bound on each bulk call.
    pub bulk_timeout: Duration,
}

/// Orchestrator that runs the six-stage reindex state machine.
///
/// ```text
/// START -> delete_stale_index -> create_index -> put_mapping
///       -> populate -> delete_old_index -> swap_alias -> DONE
/// ```
///
/// The new index is fully built and populated before any destructive action
/// touches the index currently bound to the alias, and the alias swap is
/// last: the single point after which readers observe the new data.
///
/// On failure at any stage the machine stops with the stage identity and
/// cause; completed stages are not rolled back and a failed run is
/// restarted from the beginning.
pub struct ReindexOrchestrator {
    source: Box<dyn RecordSource>,
    processor: RecordProcessor,
    lifecycle: IndexLifecycleManager,
    client: Arc<dyn SearchEngineClient>,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    // Held from construction so a shutdown() issued before run() starts is
    // still observed.
    shutdown_rx: broadcast::Receiver<()>,
}

impl ReindexOrchestrator {
    /// Create a new orchestrator over the given source and engine client.
    pub fn new(
        source: Box<dyn RecordSource>,
        processor: RecordProcessor,
        client: Arc<dyn SearchEngineClient>,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Self {
            source,
            processor,
            lifecycle: IndexLifecycleManager::new(client.clone()),
            client,
            config,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Trigger a graceful abort; observed at the next stage or record
    /// boundary.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// A handle other tasks can use to abort the run.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Execute one full reindex run.
    #[instrument(skip(self), fields(alias = %self.config.index.alias))]
    pub async fn run(&mut self) -> JobRun {
        let started_at = Utc::now();
        let mut stages: Vec<StageResult> = Vec::new();
        let mut shutdown_rx =
            std::mem::replace(&mut self.shutdown_rx, self.shutdown_tx.subscribe());

        info!(alias = %self.config.index.alias, "Starting reindex run");

        // Resolving the alias identifies both the stale target slot and the
        // currently live indices; it is part of the first stage's work.
        let bound = match self.client.indices_for_alias(&self.config.index.alias).await {
            Ok(bound) => bound,
            Err(e) => {
                return Self::finish_failed(
                    started_at,
                    stages,
                    Stage::DeleteStaleIndex,
                    e.into(),
                    String::new(),
                )
            }
        };
        let version = next_version_after(
            &self.config.index.alias,
            &bound,
            self.config.index.base_version,
        );
        let target = versioned_index_name(&self.config.index.alias, version);
        info!(target = %target, live = ?bound, "Resolved target index");

        let plan: Vec<(Stage, LifecycleOp)> = vec![
            (
                Stage::DeleteStaleIndex,
                LifecycleOp::DeleteIndexIfExists {
                    index: target.clone(),
                },
            ),
            (
                Stage::CreateIndex,
                LifecycleOp::CreateIndex {
                    index: target.clone(),
                    settings: self.config.settings.clone(),
                },
            ),
            (
                Stage::PutMapping,
                LifecycleOp::PutMapping {
                    index: target.clone(),
                    mapping: self.config.mapping.clone(),
                },
            ),
        ];

        // Stages before population: tear down any leftover target, create
        // fresh, apply the schema.
        for (stage, op) in &plan {
            if Self::cancelled(&mut shutdown_rx) {
                return Self::finish_failed(
                    started_at,
                    stages,
                    *stage,
                    PipelineError::Cancelled,
                    target,
                );
            }
            match self.lifecycle.execute(op).await {
                Ok(()) => stages.push(StageResult {
                    stage: *stage,
                    error: None,
                }),
                Err(e) => return Self::finish_failed(started_at, stages, *stage, e, target),
            }
        }

        // Population: stream records through the processor into the writer.
        // The writer is closed on every exit path.
        let writer_config = WriterConfig {
            batch_size: self.config.batch_size,
            timeout: self.config.bulk_timeout,
            ..WriterConfig::default()
        };
        let mut writer =
            BulkIndexWriter::with_config(self.client.clone(), target.clone(), writer_config);

        let populate_result = self.populate(&mut writer, &mut shutdown_rx).await;
        let close_result = writer.close().await;
        match populate_result.and(close_result) {
            Ok(()) => {
                info!(
                    documents = writer.documents_indexed(),
                    batches = writer.batches_flushed(),
                    "Population complete"
                );
                stages.push(StageResult {
                    stage: Stage::Populate,
                    error: None,
                });
            }
            Err(e) => return Self::finish_failed(started_at, stages, Stage::Populate, e, target),
        }

        // Only after a fully populated new index do we touch what is live.
        let tail: Vec<(Stage, LifecycleOp)> = vec![
            (
                Stage::DeleteOldIndex,
                LifecycleOp::DeleteAliasedIndices {
                    alias: self.config.index.alias.clone(),
                    keep: target.clone(),
                },
            ),
            (
                Stage::SwapAlias,
                LifecycleOp::SwapAlias {
                    alias: self.config.index.alias.clone(),
                    index: target.clone(),
                },
            ),
        ];
        for (stage, op) in &tail {
            if Self::cancelled(&mut shutdown_rx) {
                return Self::finish_failed(
                    started_at,
                    stages,
                    *stage,
                    PipelineError::Cancelled,
                    target,
                );
            }
            match self.lifecycle.execute(op).await {
                Ok(()) => stages.push(StageResult {
                    stage: *stage,
                    error: None,
                }),
                Err(e) => return Self::finish_failed(started_at, stages, *stage, e, target),
            }
        }

        info!(target = %target, "Reindex run completed");
        JobRun {
            started_at,
            stages,
            status: RunStatus::Completed,
            target_index: target,
        }
    }

    /// Stream the record source through the processor into the writer.
    async fn populate(
        &mut self,
        writer: &mut BulkIndexWriter,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> Result<(), PipelineError> {
        loop {
            if Self::cancelled(shutdown_rx) {
                return Err(PipelineError::Cancelled);
            }
            match self.source.next_record()? {
                None => return Ok(()),
                Some(record) => {
                    let document = self.processor.process(&record)?;
                    writer.accept(document).await?;
                }
            }
        }
    }

    fn cancelled(shutdown_rx: &mut broadcast::Receiver<()>) -> bool {
        use broadcast::error::TryRecvError;
        !matches!(
            shutdown_rx.try_recv(),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed)
        )
    }

    fn finish_failed(
        started_at: DateTime<Utc>,
        mut stages: Vec<StageResult>,
        stage: Stage,
        cause: PipelineError,
        target_index: String,
    ) -> JobRun {
        error!(stage = %stage, error = %cause, "Reindex run failed");
        stages.push(StageResult {
            stage,
            error: Some(cause.to_string()),
        });
        JobRun {
            started_at,
            stages,
            status: RunStatus::Failed { stage, cause },
            target_index,
        }
    }
}
