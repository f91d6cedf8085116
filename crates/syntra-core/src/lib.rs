pub mod types;
pub mod storage;
pub mod error;
pub mod graph;
pub mod vector;
pub mod search;
pub mod api;

pub use error::{ErrorKind, Result, SyntraError};
pub use types::*;
pub use storage::{
    ConnectionStore, GraphStore, MemoryStorage, NodeStore, RedbStorage, StorageStats,
    CURRENT_SCHEMA_VERSION,
};
pub use api::{LibraryConfig, Syntra};
pub use graph::{
    GraphConfig, GraphEngine, GraphEngineImpl, WriteConsistency, DEFAULT_SIMILARITY_THRESHOLD,
};
pub use search::{SearchConfig, SearchEngine, DEFAULT_SEARCH_LIMIT};
pub use vector::{
    clean_text, cosine_similarity, embed_content, EmbeddingService, FastEmbedService,
    OpenAiEmbeddingConfig, OpenAiEmbeddingService, DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL,
};
