//! Query pipeline façade
//!
//! Sequences normalization, retrieval, and synthesis for one request, and
//! isolates failures per stage: every fault is caught at its own boundary
//! and classified, so the caller always receives a well-formed
//! [`AnswerResponse`] and never a raw error.

use crate::normalizer::normalize;
use crate::providers::{CompletionProvider, EmbeddingProvider, VectorIndexProvider};
use crate::retriever::DocumentRetriever;
use crate::synthesizer::AnswerSynthesizer;
use crate::types::{AnswerResponse, FailureKind, RagError, RagResult, ResponseMetadata};
use docqa_core::{log_operation_error, log_operation_start, log_operation_success, DocqaConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// The complete retrieval-augmented query pipeline.
///
/// Capability handles are acquired once at construction and shared
/// read-only across requests; invocations carry no shared mutable state
/// and may run concurrently.
pub struct Pipeline {
    retriever: DocumentRetriever,
    synthesizer: AnswerSynthesizer,
}

impl Pipeline {
    /// Wire up the pipeline from the startup configuration and the
    /// capability handles. Validates the configuration up front.
    pub fn new(
        config: &DocqaConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
        llm: Arc<dyn CompletionProvider>,
    ) -> RagResult<Self> {
        config.validate()?;

        let retriever = DocumentRetriever::new(
            embedder,
            index,
            config.retrieval.clone(),
            config.embedding.timeout_ms,
        );
        let synthesizer =
            AnswerSynthesizer::new(llm, config.generation.clone(), config.llm.timeout_ms)?;

        Ok(Self {
            retriever,
            synthesizer,
        })
    }

    /// Answer a raw query string.
    ///
    /// Infallible at the boundary: stage failures come back as a
    /// `Failure`-status response with the matching classification
    /// (`InvalidQuery` before any capability is touched,
    /// `EmbeddingUnavailable`/`Timeout` from retrieval,
    /// `GenerationFailed`/`Timeout` from synthesis).
    ///
    /// Calling this twice with the same query against an unchanged index
    /// yields the same retrieval ranking; the generated answer text may
    /// still differ when the completion capability is non-deterministic.
    pub async fn answer(&self, raw_query: &str) -> AnswerResponse {
        log_operation_start!("pipeline_answer");

        // Stage 1: normalize. Fails before any capability call is made.
        let query = match normalize(raw_query) {
            Ok(query) => query,
            Err(err) => {
                log_operation_error!("pipeline_answer", err, stage = "normalize");
                return AnswerResponse::failure(FailureKind::InvalidQuery, Default::default());
            }
        };

        // Stage 2: retrieve.
        let retrieval_start = Instant::now();
        let context = match self.retriever.retrieve_default(&query).await {
            Ok(context) => context,
            Err(err) => {
                log_operation_error!("pipeline_answer", err, stage = "retrieve", query_id = %query.id);
                let metadata = ResponseMetadata {
                    retrieval_time_ms: retrieval_start.elapsed().as_millis() as u64,
                    ..Default::default()
                };
                return AnswerResponse::failure(classify_retrieval(&err), metadata);
            }
        };
        let retrieval_time_ms = retrieval_start.elapsed().as_millis() as u64;
        let chunks_retrieved = context.len();

        if context.is_empty() {
            warn!(query_id = %query.id, "No relevant chunks found for query");
        }

        // Stage 3: synthesize.
        let mut response = match self.synthesizer.synthesize(&query, context).await {
            Ok(response) => response,
            Err(err) => {
                log_operation_error!("pipeline_answer", err, stage = "synthesize", query_id = %query.id);
                let metadata = ResponseMetadata {
                    chunks_retrieved,
                    retrieval_time_ms,
                    ..Default::default()
                };
                return AnswerResponse::failure(classify_synthesis(&err), metadata);
            }
        };

        response.metadata.retrieval_time_ms = retrieval_time_ms;

        log_operation_success!(
            "pipeline_answer",
            query_id = %query.id,
            status = ?response.status,
            chunks_retrieved = response.metadata.chunks_retrieved
        );

        response
    }
}

/// Classify a retrieval-stage failure for the caller
fn classify_retrieval(err: &RagError) -> FailureKind {
    match err {
        RagError::Timeout { .. } => FailureKind::Timeout,
        _ => FailureKind::EmbeddingUnavailable,
    }
}

/// Classify a synthesis-stage failure for the caller
fn classify_synthesis(err: &RagError) -> FailureKind {
    match err {
        RagError::Timeout { .. } => FailureKind::Timeout,
        _ => FailureKind::GenerationFailed,
    }
}
