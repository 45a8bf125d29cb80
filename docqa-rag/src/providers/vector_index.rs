//! Vector index provider trait for similarity search

use crate::types::{DocumentChunk, RagResult};
use async_trait::async_trait;

/// Trait for the pre-built vector index
///
/// The pipeline uses this read-only: one nearest-neighbor query per
/// request. `insert` exists because the capability contract exposes it for
/// whoever builds the index; the query pipeline never calls it.
///
/// Implementations:
/// - `InMemoryVectorIndex`: flat in-memory index with cosine similarity
#[async_trait]
pub trait VectorIndexProvider: Send + Sync {
    /// Insert a chunk with its embedding
    async fn insert(&self, content: &str, source: &str, embedding: Vec<f32>) -> RagResult<()>;

    /// Search for the chunks nearest to `query_embedding`.
    ///
    /// Returns up to `top_k` chunks with score >= `threshold`, ordered by
    /// descending score. Implementations must document their tie-break rule
    /// for equal scores.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> RagResult<Vec<DocumentChunk>>;

    /// Total number of chunks stored
    async fn len(&self) -> RagResult<usize>;

    /// Whether the index holds no chunks
    async fn is_empty(&self) -> RagResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
