//! Processor module for the reindex pipeline.
//!
//! Transforms person records into search documents.

mod record_processor;

pub use record_processor::RecordProcessor;
