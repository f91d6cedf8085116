use crate::error::{Result, SyntraError};
use crate::storage::traits::{ConnectionStore, GraphStore, NodeStore};
use crate::types::{Connection, Node, NodeId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Inner {
    nodes: HashMap<NodeId, Node>,
    /// Insertion order, so listings are stable
    order: Vec<NodeId>,
    connections: Vec<Connection>,
}

/// Process-local storage. Nothing survives a restart.
///
/// One lock guards both nodes and connections, so the cascade delete is
/// atomic with respect to readers.
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| SyntraError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| SyntraError::LockPoisoned)
    }

    fn remove_node(inner: &mut Inner, id: NodeId) -> bool {
        if inner.nodes.remove(&id).is_none() {
            return false;
        }
        inner.order.retain(|n| *n != id);
        true
    }

    fn remove_connections(inner: &mut Inner, id: NodeId) -> usize {
        let before = inner.connections.len();
        inner.connections.retain(|c| !c.touches(id));
        before - inner.connections.len()
    }
}

impl NodeStore for MemoryStorage {
    fn insert_node(&self, node: &Node) -> Result<()> {
        let mut inner = self.write()?;
        if inner.nodes.contains_key(&node.id) {
            return Err(SyntraError::DuplicateNode(node.id));
        }
        inner.order.push(node.id);
        inner.nodes.insert(node.id, node.clone());
        Ok(())
    }

    fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.read()?.nodes.get(&id).cloned())
    }

    fn list_nodes(&self) -> Result<Vec<Node>> {
        let inner = self.read()?;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.nodes.get(id).cloned())
            .collect())
    }

    fn delete_node(&self, id: NodeId) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(Self::remove_node(&mut inner, id))
    }

    fn count_nodes(&self) -> Result<u64> {
        Ok(self.read()?.nodes.len() as u64)
    }
}

impl ConnectionStore for MemoryStorage {
    fn insert_connection(&self, connection: &Connection) -> Result<()> {
        connection
            .validate()
            .map_err(|reason| SyntraError::InvalidConnection { reason })?;

        let mut inner = self.write()?;
        for endpoint in [connection.from_node_id, connection.to_node_id] {
            if !inner.nodes.contains_key(&endpoint) {
                return Err(SyntraError::InvalidConnection {
                    reason: format!("Node {} does not exist", endpoint),
                });
            }
        }
        inner.connections.push(connection.clone());
        Ok(())
    }

    fn connections_by_endpoint(&self, id: NodeId) -> Result<Vec<Connection>> {
        Ok(self
            .read()?
            .connections
            .iter()
            .filter(|c| c.touches(id))
            .cloned()
            .collect())
    }

    fn delete_connections_by_endpoint(&self, id: NodeId) -> Result<usize> {
        let mut inner = self.write()?;
        Ok(Self::remove_connections(&mut inner, id))
    }

    fn list_connections(&self) -> Result<Vec<Connection>> {
        Ok(self.read()?.connections.clone())
    }

    fn count_connections(&self) -> Result<u64> {
        Ok(self.read()?.connections.len() as u64)
    }
}

impl GraphStore for MemoryStorage {
    fn remove_node_cascade(&self, id: NodeId) -> Result<Option<usize>> {
        let mut inner = self.write()?;
        if !Self::remove_node(&mut inner, id) {
            return Ok(None);
        }
        Ok(Some(Self::remove_connections(&mut inner, id)))
    }
}
