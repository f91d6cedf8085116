use crate::error::{Result, SyntraError};
use crate::graph::{GraphConfig, WriteConsistency};
use crate::storage::GraphStore;
use crate::types::{
    ConnectedNode, Connection, GraphSnapshot, NewNode, Node, NodeId, NodeWithConnections,
};
use crate::vector::{embed_content, score_nodes, EmbeddingService};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Node lifecycle and graph queries
#[async_trait]
pub trait GraphEngine: Send + Sync {
    /// Embed, persist and link a new node against every existing node.
    /// Returns the node with the connections formed by this insert.
    async fn create_node(&self, input: NewNode) -> Result<NodeWithConnections>;

    /// A node with its neighbors, strongest connection first.
    async fn get_node_with_connections(&self, id: NodeId) -> Result<NodeWithConnections>;

    /// Delete a node and every connection touching it.
    async fn delete_node(&self, id: NodeId) -> Result<bool>;

    /// All nodes, unordered.
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Full snapshot of nodes and connections.
    async fn get_graph(&self) -> Result<GraphSnapshot>;
}

/// Implementation of the graph engine
pub struct GraphEngineImpl<S: GraphStore, E: EmbeddingService + ?Sized> {
    storage: Arc<S>,
    embedder: Arc<E>,
    config: GraphConfig,
    write_lock: Mutex<()>,
}

impl<S: GraphStore, E: EmbeddingService + ?Sized> GraphEngineImpl<S, E> {
    /// Create a new graph engine with default configuration
    pub fn new(storage: Arc<S>, embedder: Arc<E>) -> Self {
        Self {
            storage,
            embedder,
            config: GraphConfig::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a new graph engine with custom configuration
    pub fn with_config(storage: Arc<S>, embedder: Arc<E>, config: GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            storage,
            embedder,
            config,
            write_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Take the writer lock when writes are serialized
    async fn write_guard(&self) -> Option<MutexGuard<'_, ()>> {
        match self.config.write_consistency {
            WriteConsistency::Serialized => Some(self.write_lock.lock().await),
            WriteConsistency::BestEffort => None,
        }
    }

    /// Compare `node` against every other stored node and persist a
    /// connection for each one at or above the threshold.
    fn link_new_node(&self, node: &Node) -> Result<Vec<ConnectedNode>> {
        if !node.has_embedding() {
            log::debug!("Node {} has no embedding; skipping link scan", node.id);
            return Ok(Vec::new());
        }

        let existing: Vec<Node> = self
            .storage
            .list_nodes()?
            .into_iter()
            .filter(|n| n.id != node.id)
            .collect();

        let candidates = score_nodes(&node.embedding, existing)?;

        let mut connected = Vec::new();
        for (other, similarity) in candidates {
            if similarity < self.config.similarity_threshold {
                continue;
            }

            let connection = Connection::new(node.id, other.id, similarity);
            match self.storage.insert_connection(&connection) {
                Ok(()) => {
                    log::info!(
                        "Connection created: {} -> {} (similarity: {:.3})",
                        node.id,
                        other.id,
                        similarity
                    );
                    connected.push(ConnectedNode {
                        node: other,
                        similarity_score: similarity,
                    });
                }
                // An endpoint was deleted between the scan and this write
                Err(SyntraError::InvalidConnection { reason }) => {
                    log::warn!("Skipping connection {} -> {}: {}", node.id, other.id, reason);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(connected)
    }
}

#[async_trait]
impl<S, E> GraphEngine for GraphEngineImpl<S, E>
where
    S: GraphStore + 'static,
    E: EmbeddingService + ?Sized + 'static,
{
    async fn create_node(&self, input: NewNode) -> Result<NodeWithConnections> {
        input.validate().map_err(SyntraError::Validation)?;

        log::info!("Creating node: {}", input.title);

        // Embedding happens before anything is written, so an upstream
        // failure leaves no trace.
        let embedding = embed_content(self.embedder.as_ref(), &input.content).await?;
        let node = Node::new(input, embedding);

        let _guard = self.write_guard().await;

        self.storage.insert_node(&node)?;
        log::info!("Node created with ID: {}", node.id);

        let connections = self.link_new_node(&node)?;

        Ok(NodeWithConnections { node, connections })
    }

    async fn get_node_with_connections(&self, id: NodeId) -> Result<NodeWithConnections> {
        let node = self
            .storage
            .get_node(id)?
            .ok_or(SyntraError::NodeNotFound(id))?;

        let mut connected = Vec::new();
        for connection in self.storage.connections_by_endpoint(id)? {
            let Some(other_id) = connection.opposite(id) else {
                continue;
            };

            // The other side may be mid-cascade; leave it out rather than fail.
            match self.storage.get_node(other_id)? {
                Some(other) => connected.push(ConnectedNode {
                    node: other,
                    similarity_score: connection.similarity_score,
                }),
                None => log::debug!(
                    "Connection {} points at missing node {}; skipped",
                    connection.id,
                    other_id
                ),
            }
        }

        // Stable sort: equal scores keep storage order
        connected.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));

        Ok(NodeWithConnections {
            node,
            connections: connected,
        })
    }

    async fn delete_node(&self, id: NodeId) -> Result<bool> {
        let _guard = self.write_guard().await;

        match self.storage.remove_node_cascade(id)? {
            Some(removed) => {
                log::info!("Node {} deleted along with {} connections", id, removed);
                Ok(true)
            }
            None => Err(SyntraError::NodeNotFound(id)),
        }
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.storage.list_nodes()
    }

    async fn get_graph(&self) -> Result<GraphSnapshot> {
        Ok(GraphSnapshot {
            nodes: self.storage.list_nodes()?,
            connections: self.storage.list_connections()?,
        })
    }
}
