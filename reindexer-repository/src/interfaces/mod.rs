//! Abstract interfaces for search engine operations.

mod search_engine_client;

pub use search_engine_client::{BulkItemFailure, BulkReport, SearchEngineClient};
