//! OpenSearch backend implementation.

mod client;
mod index_config;

pub use client::OpenSearchClient;
pub use index_config::{
    default_index_mapping, default_index_settings, next_version_after, parse_index_version,
    versioned_index_name, IndexConfig,
};
