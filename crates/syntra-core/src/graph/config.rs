use crate::error::{Result, SyntraError};

/// Minimum cosine similarity for materializing a connection.
///
/// Embedders and tests may override it through `GraphConfig`. The server
/// keeps 0.75 unless `SYNTRA_SIMILARITY_THRESHOLD` is set.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.75;

/// How writes that scan the graph are ordered against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteConsistency {
    /// Concurrent inserts run freely. Two nodes created at the same time may
    /// miss each other in their scans and end up unconnected.
    #[default]
    BestEffort,

    /// Insert, scan and link of a create, and the cascade of a delete, run
    /// behind a single writer lock. Reads are never blocked.
    Serialized,
}

/// Configuration for the graph engine
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Minimum cosine similarity to create a connection on insert.
    /// Default: 0.75
    pub similarity_threshold: f32,

    /// Default: best effort.
    pub write_consistency: WriteConsistency,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            write_consistency: WriteConsistency::default(),
        }
    }
}

impl GraphConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_write_consistency(mut self, consistency: WriteConsistency) -> Self {
        self.write_consistency = consistency;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // A zero threshold would connect empty-embedding nodes (similarity 0.0)
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(SyntraError::Validation(format!(
                "similarity_threshold must be in (0.0, 1.0], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}
