use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, SyntraError>;

#[derive(Debug, Error)]
pub enum SyntraError {
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage operation error: {0}")]
    StorageOperation(#[from] redb::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("Duplicate node: {0}")]
    DuplicateNode(Uuid),

    #[error("Invalid connection: {reason}")]
    InvalidConnection { reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to generate embedding: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Coarse classification used by callers that need to react to the kind of
/// failure rather than its details (the HTTP layer maps these to statuses).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape or length. Nothing was written.
    Validation,
    /// Unknown node id. Nothing was written.
    NotFound,
    /// The embedding collaborator failed.
    Upstream,
    /// Persistence layer or internal consistency failure.
    Storage,
}

impl SyntraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyntraError::Validation(_) => ErrorKind::Validation,
            SyntraError::NodeNotFound(_) => ErrorKind::NotFound,
            SyntraError::Embedding(_) => ErrorKind::Upstream,
            _ => ErrorKind::Storage,
        }
    }
}
