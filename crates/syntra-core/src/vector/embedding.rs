use crate::error::{Result, SyntraError};
use crate::types::Embedding;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding as FastEmbedModel};
use std::sync::Arc;

/// Service for generating text embeddings.
///
/// Implementations must return vectors of one fixed dimension. Failures are
/// reported as [`SyntraError::Embedding`] so callers can tell them apart from
/// storage problems.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generate embedding for a single, already cleaned, non-empty text.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Embedding dimension for the current model.
    fn dimension(&self) -> usize;

    /// Model identifier string.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<E: EmbeddingService + ?Sized> EmbeddingService for Arc<E> {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        (**self).embed(text).await
    }
    fn dimension(&self) -> usize {
        (**self).dimension()
    }
    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Normalize text before embedding: newlines become spaces, then trim.
pub fn clean_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Embed `text` after cleaning it.
///
/// Text that cleans to nothing yields an empty embedding and the service is
/// not called.
pub async fn embed_content<E: EmbeddingService + ?Sized>(
    service: &E,
    text: &str,
) -> Result<Embedding> {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }
    service.embed(&cleaned).await
}

/// FastEmbed-based embedding service (local ONNX model)
pub struct FastEmbedService {
    model: Arc<FastEmbedModel>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedService {
    /// Create a new FastEmbed service with the default model
    pub fn new() -> Result<Self> {
        Self::with_model(EmbeddingModel::BGESmallENV15)
    }

    /// Create a new FastEmbed service with a specific model
    pub fn with_model(model: EmbeddingModel) -> Result<Self> {
        let init_options = InitOptions::new(model.clone());

        let fastembed_model = FastEmbedModel::try_new(init_options)
            .map_err(|e| SyntraError::Embedding(format!("Failed to initialize FastEmbed: {}", e)))?;

        let model_name = format!("{:?}", model);
        let dimension = match model {
            EmbeddingModel::BGESmallENV15 => 384,
            EmbeddingModel::BGEBaseENV15 => 768,
            EmbeddingModel::BGELargeENV15 => 1024,
            EmbeddingModel::AllMiniLML6V2 => 384,
            EmbeddingModel::AllMiniLML12V2 => 384,
            _ => 384,
        };

        Ok(Self {
            model: Arc::new(fastembed_model),
            model_name,
            dimension,
        })
    }

    /// Pick a model by its Hugging Face name, falling back to BGE small.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "BAAI/bge-base-en-v1.5" => Self::with_model(EmbeddingModel::BGEBaseENV15),
            "BAAI/bge-large-en-v1.5" => Self::with_model(EmbeddingModel::BGELargeENV15),
            "sentence-transformers/all-MiniLM-L6-v2" => {
                Self::with_model(EmbeddingModel::AllMiniLML6V2)
            }
            _ => Self::new(),
        }
    }
}

#[async_trait]
impl EmbeddingService for FastEmbedService {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let model = Arc::clone(&self.model);
        let input = vec![text.to_string()];

        // Inference is CPU-bound; keep it off the async workers.
        let embeddings = tokio::task::spawn_blocking(move || model.embed(input, None))
            .await
            .map_err(|e| SyntraError::Embedding(format!("Embedding task failed: {}", e)))?
            .map_err(|e| SyntraError::Embedding(format!("Embedding failed: {}", e)))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SyntraError::Embedding("No embedding generated".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingService for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Embedding> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32, 1.0])
        }
        fn dimension(&self) -> usize {
            2
        }
        fn model_name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  hello\nworld \n"), "hello world");
        assert_eq!(clean_text("a\r\nb"), "a b");
        assert_eq!(clean_text("\n\n  \n"), "");
        assert_eq!(clean_text("unchanged"), "unchanged");
    }

    #[tokio::test]
    async fn test_embed_content_skips_empty_text() {
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };

        let empty = embed_content(&embedder, " \n ").await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);

        let emb = embed_content(&embedder, "ab\n").await.unwrap();
        assert_eq!(emb, vec![2.0, 1.0]);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_arc_forwarding() {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        assert_eq!(embedder.dimension(), 2);
        assert_eq!(embedder.model_name(), "counting");
        embed_content(&embedder, "x").await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[ignore] // Requires downloading model
    async fn test_fastembed_service() {
        let service = FastEmbedService::new().unwrap();
        assert_eq!(service.dimension(), 384);

        let embedding = service
            .embed("This is a test sentence for embedding generation.")
            .await
            .unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
