//! Integration tests for the reindex orchestrator.
//!
//! These tests use the real orchestrator, processor and bulk writer against
//! a fake search engine that tracks index and alias state and can inject
//! failures at chosen points.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::timeout;

use reindexer_pipeline::orchestrator::{
    OrchestratorConfig, ReindexOrchestrator, RunStatus, Stage,
};
use reindexer_pipeline::processor::RecordProcessor;
use reindexer_pipeline::source::VecRecordSource;
use reindexer_pipeline::PipelineError;
use reindexer_repository::opensearch::IndexConfig;
use reindexer_repository::{BulkItemFailure, BulkReport, SearchEngineClient, SearchError};
use reindexer_shared::{PersonDocument, PersonRecord};

/// Engine-side state: which indices exist, which are bound to the alias.
#[derive(Default)]
struct EngineState {
    indices: HashSet<String>,
    aliased: Vec<String>,
}

/// Fake search engine with state tracking and failure injection.
struct FakeEngine {
    state: Mutex<EngineState>,
    bulk_sizes: Mutex<Vec<usize>>,
    admin_calls: Mutex<Vec<String>>,
    /// When set, `create_index` fails as if the index already existed.
    fail_create_already_exists: bool,
    /// When set, any bulk batch containing this document id reports it
    /// rejected.
    reject_doc_id: Option<String>,
}

impl FakeEngine {
    fn new() -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            bulk_sizes: Mutex::new(Vec::new()),
            admin_calls: Mutex::new(Vec::new()),
            fail_create_already_exists: false,
            reject_doc_id: None,
        }
    }

    /// Engine that already serves `index` behind `alias`.
    fn with_live_index(index: &str) -> Self {
        let engine = Self::new();
        {
            let mut state = engine.state.lock().unwrap();
            state.indices.insert(index.to_string());
            state.aliased.push(index.to_string());
        }
        engine
    }

    fn indices(&self) -> HashSet<String> {
        self.state.lock().unwrap().indices.clone()
    }

    fn aliased(&self) -> Vec<String> {
        self.state.lock().unwrap().aliased.clone()
    }

    fn bulk_sizes(&self) -> Vec<usize> {
        self.bulk_sizes.lock().unwrap().clone()
    }

    fn admin_calls(&self) -> Vec<String> {
        self.admin_calls.lock().unwrap().clone()
    }

    fn record_call(&self, call: String) {
        self.admin_calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SearchEngineClient for FakeEngine {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        Ok(self.state.lock().unwrap().indices.contains(index))
    }

    async fn create_index(&self, index: &str, _settings: &Value) -> Result<(), SearchError> {
        self.record_call(format!("create:{index}"));
        if self.fail_create_already_exists {
            return Err(SearchError::index_already_exists(index));
        }
        let mut state = self.state.lock().unwrap();
        if !state.indices.insert(index.to_string()) {
            return Err(SearchError::index_already_exists(index));
        }
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        self.record_call(format!("delete:{index}"));
        let mut state = self.state.lock().unwrap();
        if !state.indices.remove(index) {
            return Err(SearchError::index_not_found(index));
        }
        // Deleting an index drops its alias bindings, as the real engine does.
        state.aliased.retain(|i| i != index);
        Ok(())
    }

    async fn put_mapping(&self, index: &str, _mapping: &Value) -> Result<(), SearchError> {
        self.record_call(format!("mapping:{index}"));
        if !self.state.lock().unwrap().indices.contains(index) {
            return Err(SearchError::index_not_found(index));
        }
        Ok(())
    }

    async fn indices_for_alias(&self, _alias: &str) -> Result<Vec<String>, SearchError> {
        Ok(self.state.lock().unwrap().aliased.clone())
    }

    async fn swap_alias(&self, alias: &str, index: &str) -> Result<(), SearchError> {
        self.record_call(format!("swap:{alias}->{index}"));
        let mut state = self.state.lock().unwrap();
        if !state.indices.contains(index) {
            return Err(SearchError::index_not_found(index));
        }
        state.aliased = vec![index.to_string()];
        Ok(())
    }

    async fn bulk_write(
        &self,
        index: &str,
        documents: &[PersonDocument],
        _timeout: Duration,
    ) -> Result<BulkReport, SearchError> {
        if !self.state.lock().unwrap().indices.contains(index) {
            return Err(SearchError::index_not_found(index));
        }
        self.bulk_sizes.lock().unwrap().push(documents.len());

        if let Some(reject_id) = &self.reject_doc_id {
            if let Some(doc) = documents.iter().find(|d| &d.id == reject_id) {
                return Ok(BulkReport {
                    total: documents.len(),
                    failures: vec![BulkItemFailure {
                        id: doc.id.clone(),
                        reason: "mapper_parsing_exception".to_string(),
                    }],
                });
            }
        }
        Ok(BulkReport::success(documents.len()))
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(true)
    }
}

fn person_records(ids: &[u32]) -> Vec<PersonRecord> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            PersonRecord::new(
                (i + 1) as u64,
                id.to_string(),
                format!("First{id}"),
                format!("Last{id}"),
            )
        })
        .collect()
}

fn build_orchestrator(
    records: Vec<PersonRecord>,
    engine: Arc<FakeEngine>,
    batch_size: usize,
) -> ReindexOrchestrator {
    ReindexOrchestrator::new(
        Box::new(VecRecordSource::new(records)),
        RecordProcessor::new(),
        engine,
        OrchestratorConfig {
            index: IndexConfig::new("people", 0),
            settings: json!({"settings": {"number_of_shards": 1}}),
            mapping: json!({"properties": {"id": {"type": "keyword"}}}),
            batch_size,
            bulk_timeout: Duration::from_secs(1),
        },
    )
}

async fn run(orchestrator: &mut ReindexOrchestrator) -> reindexer_pipeline::orchestrator::JobRun {
    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("run should not hang")
}

#[tokio::test]
async fn scenario_a_three_records_batch_size_two() {
    let engine = Arc::new(FakeEngine::new());
    let mut orchestrator = build_orchestrator(person_records(&[1, 2, 3]), engine.clone(), 2);

    let job = run(&mut orchestrator).await;

    assert!(job.is_success(), "run should complete: {:?}", job.status);
    // Exactly two flushes, sized [2, 1].
    assert_eq!(engine.bulk_sizes(), vec![2, 1]);
    // The alias ends bound to the newly created index, and only it exists.
    assert_eq!(job.target_index, "people_v0");
    assert_eq!(engine.aliased(), vec!["people_v0".to_string()]);
    assert_eq!(
        engine.indices(),
        HashSet::from(["people_v0".to_string()])
    );
}

#[tokio::test]
async fn scenario_b_create_index_conflict_halts_run() {
    let mut engine = FakeEngine::new();
    engine.fail_create_already_exists = true;
    let engine = Arc::new(engine);

    let mut orchestrator = build_orchestrator(person_records(&[1, 2]), engine.clone(), 2);
    let job = run(&mut orchestrator).await;

    match job.status {
        RunStatus::Failed { stage, cause } => {
            assert_eq!(stage, Stage::CreateIndex);
            assert!(matches!(
                cause,
                PipelineError::Search(SearchError::IndexAlreadyExists(_))
            ));
        }
        RunStatus::Completed => panic!("run should have failed at create_index"),
    }

    // Populate and swap never ran.
    assert!(engine.bulk_sizes().is_empty());
    assert!(!engine.admin_calls().iter().any(|c| c.starts_with("swap:")));
}

#[tokio::test]
async fn scenario_c_rejected_document_leaves_old_index_live() {
    let mut engine = FakeEngine::with_live_index("people_v0");
    engine.reject_doc_id = Some("2".to_string());
    let engine = Arc::new(engine);

    let mut orchestrator = build_orchestrator(person_records(&[1, 2, 3]), engine.clone(), 3);
    let job = run(&mut orchestrator).await;

    match job.status {
        RunStatus::Failed { stage, cause } => {
            assert_eq!(stage, Stage::Populate);
            match cause {
                PipelineError::BulkWrite { total, failures } => {
                    assert_eq!(total, 3);
                    assert_eq!(failures.len(), 1);
                    assert_eq!(failures[0].id, "2");
                }
                other => panic!("expected BulkWrite, got {other:?}"),
            }
        }
        RunStatus::Completed => panic!("run should have failed at populate"),
    }

    // The previously-bound alias still points at the old index; the old
    // index was never deleted and the alias never swapped.
    assert_eq!(engine.aliased(), vec!["people_v0".to_string()]);
    assert!(engine.indices().contains("people_v0"));
    assert!(!engine.admin_calls().iter().any(|c| c == "delete:people_v0"));
    assert!(!engine.admin_calls().iter().any(|c| c.starts_with("swap:")));
}

#[tokio::test]
async fn later_stages_never_execute_after_failure() {
    let mut engine = FakeEngine::new();
    engine.fail_create_already_exists = true;
    let engine = Arc::new(engine);

    let mut orchestrator = build_orchestrator(person_records(&[1]), engine.clone(), 1);
    let job = run(&mut orchestrator).await;

    assert!(!job.is_success());
    // Everything after the failing create: zero side effects.
    let calls = engine.admin_calls();
    assert_eq!(calls.last().unwrap(), "create:people_v0");
    assert!(engine.bulk_sizes().is_empty());

    // Stage history records the failure once, as the final entry.
    let failed: Vec<_> = job.stages.iter().filter(|s| s.error.is_some()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].stage, Stage::CreateIndex);
}

#[tokio::test]
async fn round_trip_two_runs_leave_one_fresh_index() {
    let engine = Arc::new(FakeEngine::new());

    // Run 1 on a virgin cluster.
    let mut first = build_orchestrator(person_records(&[1, 2, 3]), engine.clone(), 2);
    let job1 = run(&mut first).await;
    assert!(job1.is_success());
    assert_eq!(job1.target_index, "people_v0");
    assert_eq!(engine.aliased(), vec!["people_v0".to_string()]);

    // Run 2 rebuilds from scratch into the next version slot.
    let mut second = build_orchestrator(person_records(&[4, 5]), engine.clone(), 2);
    let job2 = run(&mut second).await;
    assert!(job2.is_success());
    assert_eq!(job2.target_index, "people_v1");

    // The alias is bound to the fresh index and run 1's index is gone.
    assert_eq!(engine.aliased(), vec!["people_v1".to_string()]);
    assert_eq!(
        engine.indices(),
        HashSet::from(["people_v1".to_string()])
    );
}

#[tokio::test]
async fn empty_source_completes_with_empty_index() {
    let engine = Arc::new(FakeEngine::new());
    let mut orchestrator = build_orchestrator(vec![], engine.clone(), 2);

    let job = run(&mut orchestrator).await;

    assert!(job.is_success());
    // No documents, no bulk calls, but the lifecycle still completed.
    assert!(engine.bulk_sizes().is_empty());
    assert_eq!(engine.aliased(), vec!["people_v0".to_string()]);
}

#[tokio::test]
async fn shutdown_mid_run_reports_cancelled() {
    let engine = Arc::new(FakeEngine::new());
    let mut orchestrator = build_orchestrator(person_records(&[1, 2, 3]), engine.clone(), 2);

    // Signal before the run starts; observed at the first boundary.
    orchestrator.shutdown();
    let job = run(&mut orchestrator).await;

    match job.status {
        RunStatus::Failed { cause, .. } => {
            assert!(matches!(cause, PipelineError::Cancelled));
        }
        RunStatus::Completed => panic!("run should have been cancelled"),
    }
    assert!(engine.admin_calls().is_empty());
}
