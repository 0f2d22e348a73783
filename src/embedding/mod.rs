//! Embedding generation for semantic search and retrieval.

mod ollama;
mod openai;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
///
/// Implementations are read-only after construction and safe to share
/// across concurrent queries.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the configured embedding backend.
pub fn create_embedder(settings: &EmbeddingSettings) -> Arc<dyn Embedder> {
    match settings.provider {
        EmbeddingProvider::OpenAI => Arc::new(OpenAIEmbedder::with_config(
            &settings.model,
            settings.dimensions as usize,
        )),
        EmbeddingProvider::Ollama => Arc::new(OllamaEmbedder::with_config(
            &settings.base_url,
            &settings.model,
            settings.dimensions as usize,
        )),
    }
}
