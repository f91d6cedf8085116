use clap::{Parser, ValueEnum};
use syntra_core::{
    GraphConfig, LibraryConfig, OpenAiEmbeddingConfig, SearchConfig, WriteConsistency,
    DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Which embedding backend turns node content into vectors
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/embeddings` endpoint
    Openai,
    /// Local fastembed model, no network
    Fastembed,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "syntra")]
#[command(about = "Syntra knowledge graph server")]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "SYNTRA_HTTP_ADDR", default_value = "0.0.0.0:8001")]
    pub http_addr: SocketAddr,

    /// Data directory
    #[arg(long, env = "SYNTRA_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Embedding backend
    #[arg(long, env = "SYNTRA_EMBEDDING_PROVIDER", value_enum, default_value = "openai")]
    pub embedding_provider: EmbeddingProvider,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "SYNTRA_EMBEDDING_URL", default_value = DEFAULT_OPENAI_URL)]
    pub embedding_url: String,

    /// Embedding model name. For fastembed, a BGE model id.
    #[arg(long, env = "SYNTRA_EMBEDDING_MODEL", default_value = DEFAULT_OPENAI_MODEL)]
    pub embedding_model: String,

    /// Bearer key for the embedding API
    #[arg(long, env = "SYNTRA_EMBEDDING_API_KEY", hide_env_values = true)]
    pub embedding_api_key: Option<String>,

    /// Embedding request timeout in seconds
    #[arg(long, env = "SYNTRA_EMBEDDING_TIMEOUT_SECS", default_value = "30")]
    pub embedding_timeout_secs: u64,

    /// Minimum cosine similarity for an automatic connection.
    /// Overrides the standard 0.75.
    #[arg(long, env = "SYNTRA_SIMILARITY_THRESHOLD", default_value = "0.75")]
    pub similarity_threshold: f32,

    /// Maximum search results, 1 to 10
    #[arg(long, env = "SYNTRA_SEARCH_LIMIT", default_value = "10")]
    pub search_limit: usize,

    /// Run node creation and deletion behind a single writer lock
    #[arg(
        long,
        env = "SYNTRA_SERIALIZE_WRITES",
        action = clap::ArgAction::Set,
        default_value_t = false
    )]
    pub serialize_writes: bool,
}

impl Config {
    pub fn library_config(&self) -> LibraryConfig {
        let write_consistency = if self.serialize_writes {
            WriteConsistency::Serialized
        } else {
            WriteConsistency::BestEffort
        };

        LibraryConfig {
            graph: GraphConfig::new()
                .with_similarity_threshold(self.similarity_threshold)
                .with_write_consistency(write_consistency),
            search: SearchConfig::new().with_limit(self.search_limit),
        }
    }

    pub fn openai_config(&self) -> OpenAiEmbeddingConfig {
        OpenAiEmbeddingConfig::new()
            .with_base_url(self.embedding_url.clone())
            .with_model(self.embedding_model.clone())
            .with_api_key(self.embedding_api_key.clone())
            .with_timeout(Duration::from_secs(self.embedding_timeout_secs))
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("syntra.redb")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let library = self.library_config();
        library.graph.validate()?;
        library.search.validate()?;

        if self.embedding_provider == EmbeddingProvider::Openai && self.embedding_api_key.is_none() {
            log::warn!("SYNTRA_EMBEDDING_API_KEY is not set; embedding requests are unauthenticated");
        }

        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)?;
        }
        Ok(())
    }
}
