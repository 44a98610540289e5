//! Index naming scheme, settings and mappings for the person search index.
//!
//! Physical indices are versioned (`people_v0`, `people_v1`, ...) behind a
//! stable alias. The version suffix is what makes a stale index from an
//! earlier run identifiable, and what lets a run build "behind the scenes"
//! while the previous version keeps serving reads.

use serde_json::{json, Value};

/// Configuration for the search index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The alias name readers resolve (e.g., "people").
    pub alias: String,
    /// The base version used when no versioned index exists yet.
    pub base_version: u32,
}

impl IndexConfig {
    /// Create a new index configuration.
    pub fn new(alias: impl Into<String>, base_version: u32) -> Self {
        Self {
            alias: alias.into(),
            base_version,
        }
    }
}

/// Get the versioned physical index name for an alias.
///
/// # Example
///
/// ```
/// use reindexer_repository::opensearch::versioned_index_name;
/// assert_eq!(versioned_index_name("people", 2), "people_v2");
/// ```
pub fn versioned_index_name(alias: &str, version: u32) -> String {
    format!("{}_v{}", alias, version)
}

/// Parse the version out of a physical index name, if it follows the
/// `{alias}_v{n}` scheme for the given alias.
pub fn parse_index_version(alias: &str, index: &str) -> Option<u32> {
    let suffix = index.strip_prefix(alias)?.strip_prefix("_v")?;
    suffix.parse().ok()
}

/// Compute the next free version slot given the indices currently bound to
/// the alias.
///
/// Returns `base_version` when no bound index follows the versioned naming
/// scheme (virgin cluster, or an alias managed by something else).
pub fn next_version_after(alias: &str, bound_indices: &[String], base_version: u32) -> u32 {
    bound_indices
        .iter()
        .filter_map(|index| parse_index_version(alias, index))
        .max()
        .map(|v| v + 1)
        .unwrap_or(base_version)
}

/// Built-in index settings for the person index.
///
/// Used when no settings file is configured. Kept deliberately small:
/// a single shard with one replica is enough for the reference corpus.
pub fn default_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        }
    })
}

/// Built-in mapping for the person index.
///
/// Used when no mapping file is configured.
///
/// - `id` is a keyword for exact lookups
/// - `first_name`/`last_name` are text fields with a `raw` keyword
///   sub-field for sorting and exact matches
/// - `indexed_at` records when the document was built
pub fn default_index_mapping() -> Value {
    json!({
        "properties": {
            "id": {
                "type": "keyword"
            },
            "first_name": {
                "type": "text",
                "fields": {
                    "raw": {
                        "type": "keyword"
                    }
                }
            },
            "last_name": {
                "type": "text",
                "fields": {
                    "raw": {
                        "type": "keyword"
                    }
                }
            },
            "indexed_at": {
                "type": "date"
            }
        }
    })
}
