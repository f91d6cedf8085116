use crate::error::{Result, SyntraError};
use crate::storage::traits::{ConnectionStore, GraphStore, NodeStore, StorageStats};
use crate::types::{Connection, Node, NodeId};
use redb::{
    Database, MultimapTableDefinition, ReadableMultimapTable, ReadableTable, TableDefinition,
    WriteTransaction,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Table definitions
const NODES: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("nodes");
const CONNECTIONS: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("connections");

// Endpoint indexes: node id -> connection id
const CONNECTIONS_BY_FROM: MultimapTableDefinition<&[u8; 16], &[u8; 16]> =
    MultimapTableDefinition::new("connections_by_from");
const CONNECTIONS_BY_TO: MultimapTableDefinition<&[u8; 16], &[u8; 16]> =
    MultimapTableDefinition::new("connections_by_to");

// Metadata table
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Redb-based storage implementation
pub struct RedbStorage {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbStorage {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let is_new = !path.exists();
        let db = Database::create(&path)?;

        if !is_new {
            Self::check_schema_version(&db)?;
        }

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(NODES)?;
            let _ = write_txn.open_table(CONNECTIONS)?;
            let _ = write_txn.open_multimap_table(CONNECTIONS_BY_FROM)?;
            let _ = write_txn.open_multimap_table(CONNECTIONS_BY_TO)?;
            let mut meta = write_txn.open_table(META)?;
            if is_new {
                meta.insert(
                    SCHEMA_VERSION_KEY,
                    CURRENT_SCHEMA_VERSION.to_string().as_bytes(),
                )?;
            }
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Check schema version. Returns error on any mismatch.
    fn check_schema_version(db: &Database) -> Result<()> {
        let read_txn = db.begin_read()?;
        let version = {
            let table = read_txn.open_table(META).ok();
            table
                .and_then(|t| {
                    t.get(SCHEMA_VERSION_KEY).ok().flatten().and_then(|v| {
                        std::str::from_utf8(v.value())
                            .ok()
                            .and_then(|s| s.parse::<u32>().ok())
                    })
                })
                .unwrap_or(CURRENT_SCHEMA_VERSION)
        };

        match version.cmp(&CURRENT_SCHEMA_VERSION) {
            std::cmp::Ordering::Equal => Ok(()),
            std::cmp::Ordering::Less => Err(SyntraError::Validation(format!(
                "Database schema v{} is older than current v{}",
                version, CURRENT_SCHEMA_VERSION
            ))),
            std::cmp::Ordering::Greater => Err(SyntraError::Validation(format!(
                "Database schema v{} is newer than this binary v{}. Upgrade Syntra.",
                version, CURRENT_SCHEMA_VERSION
            ))),
        }
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn uuid_to_bytes(id: &uuid::Uuid) -> [u8; 16] {
        *id.as_bytes()
    }

    fn serialize_node(node: &Node) -> Result<Vec<u8>> {
        bincode::serialize(node).map_err(SyntraError::from)
    }

    fn deserialize_node(bytes: &[u8]) -> Result<Node> {
        bincode::deserialize(bytes).map_err(SyntraError::from)
    }

    fn serialize_connection(connection: &Connection) -> Result<Vec<u8>> {
        bincode::serialize(connection).map_err(SyntraError::from)
    }

    fn deserialize_connection(bytes: &[u8]) -> Result<Connection> {
        bincode::deserialize(bytes).map_err(SyntraError::from)
    }

    fn add_to_indexes(txn: &WriteTransaction, connection: &Connection) -> Result<()> {
        let id_bytes = Self::uuid_to_bytes(&connection.id);
        let from_bytes = Self::uuid_to_bytes(&connection.from_node_id);
        let to_bytes = Self::uuid_to_bytes(&connection.to_node_id);

        {
            let mut from_table = txn.open_multimap_table(CONNECTIONS_BY_FROM)?;
            from_table.insert(&from_bytes, &id_bytes)?;
        }

        {
            let mut to_table = txn.open_multimap_table(CONNECTIONS_BY_TO)?;
            to_table.insert(&to_bytes, &id_bytes)?;
        }

        Ok(())
    }

    fn remove_from_indexes(txn: &WriteTransaction, connection: &Connection) -> Result<()> {
        let id_bytes = Self::uuid_to_bytes(&connection.id);
        let from_bytes = Self::uuid_to_bytes(&connection.from_node_id);
        let to_bytes = Self::uuid_to_bytes(&connection.to_node_id);

        {
            let mut from_table = txn.open_multimap_table(CONNECTIONS_BY_FROM)?;
            from_table.remove(&from_bytes, &id_bytes)?;
        }

        {
            let mut to_table = txn.open_multimap_table(CONNECTIONS_BY_TO)?;
            to_table.remove(&to_bytes, &id_bytes)?;
        }

        Ok(())
    }

    /// Remove a node record inside an open write transaction.
    fn remove_node_in(txn: &WriteTransaction, id: NodeId) -> Result<bool> {
        let mut nodes_table = txn.open_table(NODES)?;
        let existed = nodes_table.remove(&Self::uuid_to_bytes(&id))?.is_some();
        Ok(existed)
    }

    /// Remove every connection touching `id` inside an open write transaction.
    fn remove_connections_in(txn: &WriteTransaction, id: NodeId) -> Result<usize> {
        let node_bytes = Self::uuid_to_bytes(&id);

        // Copy ids out eagerly so the index handles are dropped before removal
        let mut connection_ids: Vec<[u8; 16]> = Vec::new();
        {
            let from_index = txn.open_multimap_table(CONNECTIONS_BY_FROM)?;
            for entry in from_index.get(&node_bytes)? {
                connection_ids.push(*entry?.value());
            }
            let to_index = txn.open_multimap_table(CONNECTIONS_BY_TO)?;
            for entry in to_index.get(&node_bytes)? {
                connection_ids.push(*entry?.value());
            }
        }
        connection_ids.sort_unstable();
        connection_ids.dedup();

        let mut removed = 0;
        for connection_id in &connection_ids {
            let bytes = {
                let mut table = txn.open_table(CONNECTIONS)?;
                let removed_bytes = table.remove(connection_id)?.map(|g| g.value().to_vec());
                removed_bytes
            };
            if let Some(bytes) = bytes {
                let connection = Self::deserialize_connection(&bytes)?;
                Self::remove_from_indexes(txn, &connection)?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

impl NodeStore for RedbStorage {
    fn insert_node(&self, node: &Node) -> Result<()> {
        let node_id_bytes = Self::uuid_to_bytes(&node.id);
        let node_bytes = Self::serialize_node(node)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut nodes_table = write_txn.open_table(NODES)?;
            let exists = nodes_table.get(&node_id_bytes)?.is_some();
            if exists {
                return Err(SyntraError::DuplicateNode(node.id));
            }
            nodes_table.insert(&node_id_bytes, node_bytes.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NODES)?;

        match table.get(&Self::uuid_to_bytes(&id))? {
            Some(bytes) => Ok(Some(Self::deserialize_node(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn list_nodes(&self) -> Result<Vec<Node>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NODES)?;

        let mut nodes = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            nodes.push(Self::deserialize_node(value.value())?);
        }
        Ok(nodes)
    }

    fn delete_node(&self, id: NodeId) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = Self::remove_node_in(&write_txn, id)?;
        write_txn.commit()?;
        Ok(existed)
    }

    fn count_nodes(&self) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NODES)?;
        Ok(table.iter()?.count() as u64)
    }
}

impl ConnectionStore for RedbStorage {
    fn insert_connection(&self, connection: &Connection) -> Result<()> {
        connection
            .validate()
            .map_err(|reason| SyntraError::InvalidConnection { reason })?;

        let from_bytes = Self::uuid_to_bytes(&connection.from_node_id);
        let to_bytes = Self::uuid_to_bytes(&connection.to_node_id);
        let connection_bytes = Self::serialize_connection(connection)?;

        // Single write transaction: check endpoints, write, index
        let write_txn = self.db.begin_write()?;

        {
            let nodes_table = write_txn.open_table(NODES)?;
            if nodes_table.get(&from_bytes)?.is_none() {
                return Err(SyntraError::InvalidConnection {
                    reason: format!("Source node {} does not exist", connection.from_node_id),
                });
            }
            if nodes_table.get(&to_bytes)?.is_none() {
                return Err(SyntraError::InvalidConnection {
                    reason: format!("Target node {} does not exist", connection.to_node_id),
                });
            }
        }

        {
            let mut table = write_txn.open_table(CONNECTIONS)?;
            table.insert(&Self::uuid_to_bytes(&connection.id), connection_bytes.as_slice())?;
        }

        Self::add_to_indexes(&write_txn, connection)?;

        write_txn.commit()?;
        Ok(())
    }

    fn connections_by_endpoint(&self, id: NodeId) -> Result<Vec<Connection>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONNECTIONS)?;
        let from_index = read_txn.open_multimap_table(CONNECTIONS_BY_FROM)?;
        let to_index = read_txn.open_multimap_table(CONNECTIONS_BY_TO)?;

        let node_bytes = Self::uuid_to_bytes(&id);
        let mut ids: Vec<[u8; 16]> = Vec::new();
        for entry in from_index.get(&node_bytes)? {
            ids.push(*entry?.value());
        }
        for entry in to_index.get(&node_bytes)? {
            ids.push(*entry?.value());
        }

        let mut connections = Vec::with_capacity(ids.len());
        for connection_id in &ids {
            if let Some(bytes) = table.get(connection_id)? {
                connections.push(Self::deserialize_connection(bytes.value())?);
            }
        }
        Ok(connections)
    }

    fn delete_connections_by_endpoint(&self, id: NodeId) -> Result<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = Self::remove_connections_in(&write_txn, id)?;
        write_txn.commit()?;
        Ok(removed)
    }

    fn list_connections(&self) -> Result<Vec<Connection>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONNECTIONS)?;

        let mut connections = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            connections.push(Self::deserialize_connection(value.value())?);
        }
        Ok(connections)
    }

    fn count_connections(&self) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONNECTIONS)?;
        Ok(table.iter()?.count() as u64)
    }
}

impl GraphStore for RedbStorage {
    /// Node and connections go in one write transaction, so readers see
    /// either both or neither.
    fn remove_node_cascade(&self, id: NodeId) -> Result<Option<usize>> {
        let write_txn = self.db.begin_write()?;
        if !Self::remove_node_in(&write_txn, id)? {
            write_txn.abort()?;
            return Ok(None);
        }
        let removed = Self::remove_connections_in(&write_txn, id)?;
        write_txn.commit()?;
        Ok(Some(removed))
    }

    fn stats(&self) -> Result<StorageStats> {
        let db_size_bytes = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);

        Ok(StorageStats {
            node_count: self.count_nodes()?,
            connection_count: self.count_connections()?,
            db_size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewNode;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn create_test_storage() -> (RedbStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.redb");
        let storage = RedbStorage::open(&db_path).unwrap();
        (storage, temp_dir)
    }

    fn create_test_node(title: &str, embedding: Vec<f32>) -> Node {
        Node::new(NewNode::new("note", title, "Test content"), embedding)
    }

    #[test]
    fn test_node_crud() {
        let (storage, _temp) = create_test_storage();

        let node = create_test_node("Test Note", vec![0.1, 0.2]);
        storage.insert_node(&node).unwrap();

        let retrieved = storage.get_node(node.id).unwrap().unwrap();
        assert_eq!(retrieved, node);

        assert_eq!(storage.list_nodes().unwrap().len(), 1);
        assert!(storage.delete_node(node.id).unwrap());
        assert!(storage.get_node(node.id).unwrap().is_none());

        // Second delete reports not found instead of failing
        assert!(!storage.delete_node(node.id).unwrap());
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let (storage, _temp) = create_test_storage();
        let node = create_test_node("Once", vec![]);
        storage.insert_node(&node).unwrap();

        let err = storage.insert_node(&node).unwrap_err();
        assert!(matches!(err, SyntraError::DuplicateNode(id) if id == node.id));
    }

    #[test]
    fn test_connection_requires_endpoints() {
        let (storage, _temp) = create_test_storage();
        let node = create_test_node("Lonely", vec![1.0]);
        storage.insert_node(&node).unwrap();

        let dangling = Connection::new(node.id, Uuid::now_v7(), 0.9);
        assert!(matches!(
            storage.insert_connection(&dangling),
            Err(SyntraError::InvalidConnection { .. })
        ));

        let self_loop = Connection::new(node.id, node.id, 0.9);
        assert!(storage.insert_connection(&self_loop).is_err());
        assert_eq!(storage.count_connections().unwrap(), 0);
    }

    #[test]
    fn test_connections_by_either_endpoint() {
        let (storage, _temp) = create_test_storage();
        let a = create_test_node("A", vec![1.0]);
        let b = create_test_node("B", vec![1.0]);
        let c = create_test_node("C", vec![1.0]);
        for n in [&a, &b, &c] {
            storage.insert_node(n).unwrap();
        }

        // b -> a, c -> a, c -> b
        storage.insert_connection(&Connection::new(b.id, a.id, 0.8)).unwrap();
        storage.insert_connection(&Connection::new(c.id, a.id, 0.9)).unwrap();
        storage.insert_connection(&Connection::new(c.id, b.id, 0.77)).unwrap();

        assert_eq!(storage.connections_by_endpoint(a.id).unwrap().len(), 2);
        assert_eq!(storage.connections_by_endpoint(b.id).unwrap().len(), 2);
        assert_eq!(storage.connections_by_endpoint(c.id).unwrap().len(), 2);
        assert_eq!(storage.list_connections().unwrap().len(), 3);
    }

    #[test]
    fn test_delete_connections_by_endpoint() {
        let (storage, _temp) = create_test_storage();
        let a = create_test_node("A", vec![1.0]);
        let b = create_test_node("B", vec![1.0]);
        let c = create_test_node("C", vec![1.0]);
        for n in [&a, &b, &c] {
            storage.insert_node(n).unwrap();
        }
        storage.insert_connection(&Connection::new(b.id, a.id, 0.8)).unwrap();
        storage.insert_connection(&Connection::new(c.id, b.id, 0.9)).unwrap();
        storage.insert_connection(&Connection::new(c.id, a.id, 0.76)).unwrap();

        assert_eq!(storage.delete_connections_by_endpoint(b.id).unwrap(), 2);

        let remaining = storage.list_connections().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(!remaining[0].touches(b.id));

        // Indexes were cleaned along with the records
        assert!(storage.connections_by_endpoint(b.id).unwrap().is_empty());
        assert_eq!(storage.connections_by_endpoint(a.id).unwrap().len(), 1);
        assert_eq!(storage.delete_connections_by_endpoint(b.id).unwrap(), 0);
    }

    #[test]
    fn test_remove_node_cascade() {
        let (storage, _temp) = create_test_storage();
        let a = create_test_node("A", vec![1.0]);
        let b = create_test_node("B", vec![1.0]);
        storage.insert_node(&a).unwrap();
        storage.insert_node(&b).unwrap();
        storage.insert_connection(&Connection::new(b.id, a.id, 0.8)).unwrap();

        assert_eq!(storage.remove_node_cascade(a.id).unwrap(), Some(1));
        assert!(storage.get_node(a.id).unwrap().is_none());
        assert!(storage.connections_by_endpoint(b.id).unwrap().is_empty());

        assert_eq!(storage.remove_node_cascade(a.id).unwrap(), None);
        assert_eq!(storage.count_nodes().unwrap(), 1);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("reopen.redb");

        let (a, b) = {
            let storage = RedbStorage::open(&db_path).unwrap();
            let a = create_test_node("A", vec![0.5, 0.5]);
            let b = create_test_node("B", vec![0.5, 0.4]);
            storage.insert_node(&a).unwrap();
            storage.insert_node(&b).unwrap();
            storage.insert_connection(&Connection::new(b.id, a.id, 0.99)).unwrap();
            (a, b)
        };

        let storage = RedbStorage::open(&db_path).unwrap();
        assert_eq!(storage.get_node(a.id).unwrap().unwrap().embedding, vec![0.5, 0.5]);
        let connections = storage.connections_by_endpoint(a.id).unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].from_node_id, b.id);

        let stats = storage.stats().unwrap();
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.connection_count, 1);
        assert!(stats.db_size_bytes > 0);
    }
}
