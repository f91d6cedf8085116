mod memory;
mod redb_storage;
mod traits;

pub use memory::MemoryStorage;
pub use redb_storage::{RedbStorage, CURRENT_SCHEMA_VERSION};
pub use traits::{ConnectionStore, GraphStore, NodeStore, StorageStats};
