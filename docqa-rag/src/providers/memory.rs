//! In-memory vector index
//!
//! A flat chunk list scanned with cosine similarity. Suits small
//! collections and tests; the handle is acquired once at startup and
//! shared read-only across requests, with a `RwLock` guarding inserts.

use crate::providers::vector_index::VectorIndexProvider;
use crate::types::{DocumentChunk, RagError, RagResult};
use async_trait::async_trait;
use std::sync::RwLock;
use tracing::{info, warn};

struct IndexEntry {
    content: String,
    source: String,
    embedding: Vec<f32>,
}

/// Simple in-memory vector index with cosine similarity search.
///
/// Tie-break rule: equal scores keep insertion order (the scan enumerates
/// entries in insertion order and the ranking sort is stable).
pub struct InMemoryVectorIndex {
    entries: RwLock<Vec<IndexEntry>>,
    dimension: usize,
}

impl InMemoryVectorIndex {
    /// Create an empty index for embeddings of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            dimension,
        }
    }

    /// Embedding dimension this index accepts
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl VectorIndexProvider for InMemoryVectorIndex {
    async fn insert(&self, content: &str, source: &str, embedding: Vec<f32>) -> RagResult<()> {
        if embedding.len() != self.dimension {
            return Err(RagError::Config(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        let mut entries = self.entries.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.push(IndexEntry {
            content: content.to_string(),
            source: source.to_string(),
            embedding,
        });

        info!(total = entries.len(), "Added chunk to vector index");
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> RagResult<Vec<DocumentChunk>> {
        if query_embedding.len() != self.dimension {
            warn!(
                expected = self.dimension,
                got = query_embedding.len(),
                "Query embedding dimension mismatch"
            );
            return Ok(Vec::new());
        }

        let entries = self.entries.read().unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut scored: Vec<DocumentChunk> = entries
            .iter()
            .map(|entry| DocumentChunk {
                content: entry.content.clone(),
                source: entry.source.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .filter(|chunk| chunk.score >= threshold)
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn len(&self) -> RagResult<usize> {
        Ok(self.entries.read().unwrap_or_else(std::sync::PoisonError::into_inner).len())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Calculate cosine similarity between two vectors
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
