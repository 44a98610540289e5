//! Configuration and dependency wiring for the reindexer.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::ReindexConfig;
