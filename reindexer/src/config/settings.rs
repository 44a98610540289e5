//! Environment-resolved configuration.
//!
//! All settings are resolved once at process start and passed by value into
//! the components; no component performs its own environment lookup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::ReindexerError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default alias readers resolve.
const DEFAULT_INDEX_ALIAS: &str = "people";

/// Default documents per bulk batch.
const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default bound on each bulk call, in milliseconds.
const DEFAULT_BULK_TIMEOUT_MS: u64 = 30_000;

/// Resolved configuration for one reindex run.
///
/// # Environment Variables
///
/// - `OPENSEARCH_URL`: engine URL (default: http://localhost:9200)
/// - `INDEX_ALIAS`: alias name (default: people)
/// - `INDEX_BASE_VERSION`: version used on a virgin cluster (default: 0)
/// - `CSV_PATH`: path to the person CSV file (required)
/// - `INDEX_SETTINGS_PATH`: settings JSON file (optional; built-in default)
/// - `INDEX_MAPPING_PATH`: mapping JSON file (optional; built-in default)
/// - `BATCH_SIZE`: documents per bulk batch (default: 1000)
/// - `BULK_TIMEOUT_MS`: bound on each bulk call (default: 30000)
#[derive(Debug, Clone)]
pub struct ReindexConfig {
    pub opensearch_url: String,
    pub alias: String,
    pub base_version: u32,
    pub csv_path: PathBuf,
    pub settings_path: Option<PathBuf>,
    pub mapping_path: Option<PathBuf>,
    pub batch_size: usize,
    pub bulk_timeout: Duration,
}

impl ReindexConfig {
    /// Resolve the configuration from the environment, failing fast on a
    /// missing or invalid required setting.
    pub fn from_env() -> Result<Self, ReindexerError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let alias = env::var("INDEX_ALIAS").unwrap_or_else(|_| DEFAULT_INDEX_ALIAS.to_string());

        let base_version = match env::var("INDEX_BASE_VERSION") {
            Err(_) => 0,
            Ok(raw) => raw.parse().map_err(|_| {
                ReindexerError::config(format!("INDEX_BASE_VERSION is not a number: {raw}"))
            })?,
        };

        let csv_path = env::var("CSV_PATH")
            .map(PathBuf::from)
            .map_err(|_| ReindexerError::config("CSV_PATH is required"))?;

        let settings_path = env::var("INDEX_SETTINGS_PATH").ok().map(PathBuf::from);
        let mapping_path = env::var("INDEX_MAPPING_PATH").ok().map(PathBuf::from);

        let batch_size = match env::var("BATCH_SIZE") {
            Err(_) => DEFAULT_BATCH_SIZE,
            Ok(raw) => {
                let parsed: usize = raw.parse().map_err(|_| {
                    ReindexerError::config(format!("BATCH_SIZE is not a number: {raw}"))
                })?;
                if parsed == 0 {
                    return Err(ReindexerError::config("BATCH_SIZE must be positive"));
                }
                parsed
            }
        };

        let bulk_timeout_ms = match env::var("BULK_TIMEOUT_MS") {
            Err(_) => DEFAULT_BULK_TIMEOUT_MS,
            Ok(raw) => raw.parse().map_err(|_| {
                ReindexerError::config(format!("BULK_TIMEOUT_MS is not a number: {raw}"))
            })?,
        };

        Ok(Self {
            opensearch_url,
            alias,
            base_version,
            csv_path,
            settings_path,
            mapping_path,
            batch_size,
            bulk_timeout: Duration::from_millis(bulk_timeout_ms),
        })
    }
}
