//! Dependency initialization and wiring for the reindexer.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::config::ReindexConfig;
use crate::ReindexerError;
use reindexer_pipeline::{
    orchestrator::{OrchestratorConfig, ReindexOrchestrator},
    processor::RecordProcessor,
    source::CsvRecordSource,
};
use reindexer_repository::opensearch::{
    default_index_mapping, default_index_settings, IndexConfig,
};
use reindexer_repository::{OpenSearchClient, SearchEngineClient};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: ReindexOrchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from a resolved configuration.
    ///
    /// Reads the settings/mapping blobs, connects the engine client and
    /// verifies it is reachable, then wires source, processor and
    /// orchestrator. Everything here fails before any stage runs.
    pub async fn new(config: &ReindexConfig) -> Result<Self, ReindexerError> {
        info!(
            opensearch_url = %config.opensearch_url,
            alias = %config.alias,
            csv_path = %config.csv_path.display(),
            batch_size = config.batch_size,
            "Initializing dependencies"
        );

        let settings = match &config.settings_path {
            Some(path) => read_json_blob(path, "settings")?,
            None => default_index_settings(),
        };
        let mapping = match &config.mapping_path {
            Some(path) => read_json_blob(path, "mapping")?,
            None => default_index_mapping(),
        };

        let client = OpenSearchClient::new(&config.opensearch_url).map_err(|e| {
            ReindexerError::config(format!("Failed to create OpenSearch client: {e}"))
        })?;
        let client: Arc<dyn SearchEngineClient> = Arc::new(client);

        // Verify the engine is reachable before touching any index.
        let healthy = client
            .health_check()
            .await
            .map_err(|e| ReindexerError::config(format!("OpenSearch health check failed: {e}")))?;
        if !healthy {
            return Err(ReindexerError::config("OpenSearch cluster is unhealthy"));
        }
        info!("OpenSearch is reachable");

        let source = CsvRecordSource::new(&config.csv_path);

        let orchestrator = ReindexOrchestrator::new(
            Box::new(source),
            RecordProcessor::new(),
            client,
            OrchestratorConfig {
                index: IndexConfig::new(config.alias.clone(), config.base_version),
                settings,
                mapping,
                batch_size: config.batch_size,
                bulk_timeout: config.bulk_timeout,
            },
        );

        Ok(Self { orchestrator })
    }
}

/// Read and parse an opaque JSON configuration blob.
fn read_json_blob(path: &Path, label: &str) -> Result<Value, ReindexerError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        ReindexerError::config(format!("cannot read {} file {}: {}", label, path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        ReindexerError::config(format!("invalid {} JSON in {}: {}", label, path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_json_blob_parses_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"settings": {"number_of_shards": 1}}"#)
            .unwrap();
        file.flush().unwrap();

        let blob = read_json_blob(file.path(), "settings").unwrap();
        assert_eq!(blob["settings"]["number_of_shards"], 1);
    }

    #[test]
    fn test_read_json_blob_missing_file() {
        let err = read_json_blob(Path::new("/nonexistent.json"), "mapping").unwrap_err();
        assert!(matches!(err, ReindexerError::ConfigError(_)));
        assert!(err.to_string().contains("mapping"));
    }

    #[test]
    fn test_read_json_blob_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        file.flush().unwrap();

        let err = read_json_blob(file.path(), "settings").unwrap_err();
        assert!(matches!(err, ReindexerError::ConfigError(_)));
    }
}
