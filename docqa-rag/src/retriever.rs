//! Document retrieval
//!
//! Finds the chunks most relevant to a query: embeds the query text,
//! runs a nearest-neighbor search against the vector index, and enforces
//! the ordering and size invariants of the result.

use crate::providers::{EmbeddingProvider, VectorIndexProvider};
use crate::types::{Query, RagError, RagResult, RetrievalResult, Stage};
use docqa_core::{with_timeout, DocqaError, RetrievalConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Retrieves relevant chunks for queries against a shared read-only index.
///
/// Never retries: a failing embedding capability surfaces immediately as
/// [`RagError::EmbeddingUnavailable`]. Retry policy, if any, lives in the
/// capability's own client.
pub struct DocumentRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndexProvider>,
    config: RetrievalConfig,
    embed_timeout_ms: u64,
}

impl DocumentRetriever {
    /// Create a new retriever over shared capability handles
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
        config: RetrievalConfig,
        embed_timeout_ms: u64,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
            embed_timeout_ms,
        }
    }

    /// Retrieve up to `k` chunks ordered by descending relevance.
    ///
    /// An empty index (or nothing above the similarity threshold) yields an
    /// empty result, not an error. Equal scores keep the index's insertion
    /// order: the ranking sort is stable over the index scan order.
    pub async fn retrieve(&self, query: &Query, k: usize) -> RagResult<RetrievalResult> {
        if k == 0 {
            return Err(RagError::Config("top_k must be greater than 0".to_string()));
        }

        let start_time = Instant::now();
        debug!(query_id = %query.id, k, "Retrieving documents");

        let embedding = match with_timeout(
            self.embedder.embed(&query.text),
            self.embed_timeout_ms,
            "embed_query",
        )
        .await
        {
            Ok(result) => result?,
            Err(DocqaError::Timeout { duration_ms, .. }) => {
                return Err(RagError::Timeout {
                    stage: Stage::Retrieval,
                    timeout_ms: duration_ms,
                });
            }
            Err(other) => return Err(other.into()),
        };

        let mut chunks = self
            .index
            .search(&embedding, k, self.config.similarity_threshold)
            .await
            .map_err(|e| match e {
                err @ (RagError::EmbeddingUnavailable(_) | RagError::Timeout { .. }) => err,
                other => RagError::EmbeddingUnavailable(format!(
                    "vector index query failed: {}",
                    other
                )),
            })?;

        // The in-process index already ranks its results; re-sorting here
        // keeps the ordering invariant independent of the capability. The
        // sort is stable, so ties preserve the index's own order.
        chunks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        chunks.truncate(k);

        info!(
            query_id = %query.id,
            retrieved = chunks.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            threshold = self.config.similarity_threshold,
            "Retrieval complete"
        );

        Ok(RetrievalResult::from_ranked(chunks))
    }

    /// Retrieve with the configured top-k
    pub async fn retrieve_default(&self, query: &Query) -> RagResult<RetrievalResult> {
        self.retrieve(query, self.config.top_k).await
    }

    /// Configured top-k
    pub fn top_k(&self) -> usize {
        self.config.top_k
    }
}
