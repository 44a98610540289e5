//! # Reindexer Pipeline
//!
//! This crate provides the components for rebuilding the person search
//! index from a record source and promoting the result atomically.
//!
//! ## Architecture
//!
//! The pipeline follows the Source-Processor-Writer pattern, gated by
//! index lifecycle operations:
//!
//! 1. **Source**: Pulls person records from a flat file or cursor
//! 2. **Processor**: Transforms records into search documents
//! 3. **Writer**: Flushes fixed-size batches to the search engine
//! 4. **Lifecycle**: Administrative index operations (create, mapping, alias)
//! 5. **Orchestrator**: Sequences the stages of one reindex run

pub mod errors;
pub mod lifecycle;
pub mod orchestrator;
pub mod processor;
pub mod source;
pub mod writer;

pub use errors::PipelineError;
