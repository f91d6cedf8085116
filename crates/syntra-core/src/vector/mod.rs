mod embedding;
mod openai;
mod scoring;
mod similarity;

pub use embedding::{clean_text, embed_content, EmbeddingService, FastEmbedService};
pub use openai::{
    OpenAiEmbeddingConfig, OpenAiEmbeddingService, DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL,
};
pub use scoring::{rank_descending, score_nodes};
pub use similarity::cosine_similarity;
