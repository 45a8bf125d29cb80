//! Embedding provider trait for mapping text to vectors

use crate::types::RagResult;
use async_trait::async_trait;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OpenAiEmbedder`: OpenAI-compatible `/embeddings` endpoint
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>>;

    /// Get embedding dimensions (e.g. 1536 for text-embedding-3-small)
    fn dimensions(&self) -> usize;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
