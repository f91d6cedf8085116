use crate::error::Result;
use crate::graph::{GraphConfig, GraphEngine, GraphEngineImpl};
use crate::search::{SearchConfig, SearchEngine};
use crate::storage::{GraphStore, RedbStorage, StorageStats};
use crate::types::{GraphSnapshot, NewNode, Node, NodeId, NodeWithConnections, SearchResult};
use crate::vector::EmbeddingService;
use std::path::Path;
use std::sync::Arc;

/// Config for embedded library mode.
#[derive(Debug, Clone, Default)]
pub struct LibraryConfig {
    pub graph: GraphConfig,
    pub search: SearchConfig,
}

/// High-level Syntra API: one store, one embedder, graph and search
/// engines sharing both.
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use syntra_core::{FastEmbedService, LibraryConfig, NewNode, Syntra};
///
/// # async fn run() -> syntra_core::Result<()> {
/// let embedder = Arc::new(FastEmbedService::new()?);
/// let syntra = Syntra::open("./syntra.redb", embedder, LibraryConfig::default())?;
/// let created = syntra
///     .create_node(NewNode::new("quote", "Habit", "We are what we repeatedly do."))
///     .await?;
/// let results = syntra.search("habits").await?;
/// # Ok(())
/// # }
/// ```
pub struct Syntra<S: GraphStore + 'static = RedbStorage> {
    storage: Arc<S>,
    embedder: Arc<dyn EmbeddingService>,
    graph: GraphEngineImpl<S, dyn EmbeddingService>,
    search: SearchEngine<S, dyn EmbeddingService>,
}

impl Syntra<RedbStorage> {
    /// Open (or create) a Syntra database at the given path.
    pub fn open(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingService>,
        config: LibraryConfig,
    ) -> Result<Self> {
        let storage = Arc::new(RedbStorage::open(path.as_ref())?);
        Self::new(storage, embedder, config)
    }
}

impl<S: GraphStore + 'static> Syntra<S> {
    pub fn new(
        storage: Arc<S>,
        embedder: Arc<dyn EmbeddingService>,
        config: LibraryConfig,
    ) -> Result<Self> {
        let graph = GraphEngineImpl::with_config(storage.clone(), embedder.clone(), config.graph)?;
        let search = SearchEngine::with_config(storage.clone(), embedder.clone(), config.search)?;
        Ok(Self {
            storage,
            embedder,
            graph,
            search,
        })
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingService> {
        &self.embedder
    }

    pub fn graph_config(&self) -> &GraphConfig {
        self.graph.config()
    }

    pub async fn create_node(&self, input: NewNode) -> Result<NodeWithConnections> {
        self.graph.create_node(input).await
    }

    pub async fn get_node_with_connections(&self, id: NodeId) -> Result<NodeWithConnections> {
        self.graph.get_node_with_connections(id).await
    }

    pub async fn delete_node(&self, id: NodeId) -> Result<bool> {
        self.graph.delete_node(id).await
    }

    pub async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.graph.list_nodes().await
    }

    pub async fn get_graph(&self) -> Result<GraphSnapshot> {
        self.graph.get_graph().await
    }

    /// Semantic search. Returns nodes ranked by similarity.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.search.search(query).await
    }

    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.stats()
    }
}
