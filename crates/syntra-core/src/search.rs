use crate::error::{Result, SyntraError};
use crate::storage::NodeStore;
use crate::types::SearchResult;
use crate::vector::{embed_content, rank_descending, score_nodes, EmbeddingService};
use std::sync::Arc;

/// Number of results returned by a search, and the most any search may return.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Configuration for semantic search
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum number of results. Must be in 1..=10. Default: 10
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > DEFAULT_SEARCH_LIMIT {
            return Err(SyntraError::Validation(format!(
                "search limit must be in 1..={}, got {}",
                DEFAULT_SEARCH_LIMIT, self.limit
            )));
        }
        Ok(())
    }
}

/// Ranks stored nodes against a free-text query.
///
/// Every node with an embedding is scored; there is no similarity floor.
pub struct SearchEngine<S: NodeStore, E: EmbeddingService + ?Sized> {
    storage: Arc<S>,
    embedder: Arc<E>,
    config: SearchConfig,
}

impl<S: NodeStore, E: EmbeddingService + ?Sized> SearchEngine<S, E> {
    pub fn new(storage: Arc<S>, embedder: Arc<E>) -> Self {
        Self {
            storage,
            embedder,
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(storage: Arc<S>, embedder: Arc<E>, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            storage,
            embedder,
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Top matches for `query`, most similar first.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(SyntraError::Validation("Search query cannot be empty".into()));
        }

        log::debug!("Searching for: {}", query);

        let query_embedding = embed_content(self.embedder.as_ref(), query).await?;
        if query_embedding.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = score_nodes(&query_embedding, self.storage.list_nodes()?)?;
        rank_descending(&mut scored);
        scored.truncate(self.config.limit);

        Ok(scored
            .into_iter()
            .map(|(node, similarity)| SearchResult { node, similarity })
            .collect())
    }
}
