mod config;
mod engine;

pub use config::{GraphConfig, WriteConsistency, DEFAULT_SIMILARITY_THRESHOLD};
pub use engine::{GraphEngine, GraphEngineImpl};
