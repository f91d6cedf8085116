use crate::error::Result;
use crate::types::{Connection, Node, NodeId};
use serde::Serialize;

/// Persistence for knowledge nodes
pub trait NodeStore: Send + Sync {
    /// Persist a complete node record, embedding included.
    /// Fails with `DuplicateNode` if the id is already taken.
    fn insert_node(&self, node: &Node) -> Result<()>;

    /// Retrieve a node by ID
    fn get_node(&self, id: NodeId) -> Result<Option<Node>>;

    /// All nodes. No ordering guarantee.
    fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Remove a node. Returns `false` if it did not exist.
    fn delete_node(&self, id: NodeId) -> Result<bool>;

    fn count_nodes(&self) -> Result<u64> {
        Ok(self.list_nodes()?.len() as u64)
    }
}

/// Persistence for similarity connections
pub trait ConnectionStore: Send + Sync {
    /// Persist a connection. Both endpoints must exist.
    fn insert_connection(&self, connection: &Connection) -> Result<()>;

    /// Every connection naming `id` as either endpoint
    fn connections_by_endpoint(&self, id: NodeId) -> Result<Vec<Connection>>;

    /// Remove every connection naming `id` as either endpoint.
    /// Returns the number removed.
    fn delete_connections_by_endpoint(&self, id: NodeId) -> Result<usize>;

    /// All connections. No ordering guarantee.
    fn list_connections(&self) -> Result<Vec<Connection>>;

    fn count_connections(&self) -> Result<u64> {
        Ok(self.list_connections()?.len() as u64)
    }
}

/// A store holding both halves of the graph.
pub trait GraphStore: NodeStore + ConnectionStore {
    /// Delete a node and every connection touching it.
    ///
    /// Returns `None` if the node did not exist, otherwise the number of
    /// connections removed. The default runs the two deletes back to back;
    /// stores with transactions should override it to make the pair atomic.
    fn remove_node_cascade(&self, id: NodeId) -> Result<Option<usize>> {
        if !self.delete_node(id)? {
            return Ok(None);
        }
        Ok(Some(self.delete_connections_by_endpoint(id)?))
    }

    /// Get database statistics
    fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            node_count: self.count_nodes()?,
            connection_count: self.count_connections()?,
            db_size_bytes: 0,
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub node_count: u64,
    pub connection_count: u64,
    /// Size of the backing file. Zero for in-memory stores.
    pub db_size_bytes: u64,
}
