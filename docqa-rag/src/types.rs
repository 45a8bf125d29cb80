//! Type definitions for the query pipeline
//!
//! This module defines the request-scoped types that flow through one
//! pipeline invocation, plus the stage-level error taxonomy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A validated query, produced by [`crate::normalizer::normalize`].
///
/// Immutable once constructed; the id correlates every log line emitted
/// while the query is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Identifier for correlating logs across stages
    pub id: Uuid,
    /// Original text as received
    pub raw: String,
    /// Trimmed text used for retrieval and generation
    pub text: String,
}

/// A retrieved unit of context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Opaque text content
    pub content: String,
    /// Source identifier (file path, document id, URL)
    pub source: String,
    /// Relevance score, higher is more relevant
    pub score: f32,
}

/// An ordered sequence of chunks, descending by relevance score.
///
/// Invariants maintained by the retriever: `len() <= k` and non-increasing
/// scores. May be empty (empty index, or nothing above threshold).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    chunks: Vec<DocumentChunk>,
}

impl RetrievalResult {
    /// Wrap chunks already ranked by descending score
    pub fn from_ranked(chunks: Vec<DocumentChunk>) -> Self {
        Self { chunks }
    }

    pub fn empty() -> Self {
        Self { chunks: Vec::new() }
    }

    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<DocumentChunk> {
        self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentChunk> {
        self.chunks.iter()
    }
}

/// The assembled unit handed to the completion capability
#[derive(Debug, Clone)]
pub struct AnswerRequest {
    /// Final prompt, context plus question under the instruction template
    pub prompt: String,
    /// Number of chunks that made it into the prompt
    pub chunks_used: usize,
    /// Whether lower-ranked chunks were dropped to meet the context budget
    pub context_truncated: bool,
    /// Whether the prompt carries the explicit no-context marker
    pub no_context: bool,
}

/// Outcome status of one pipeline invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// Answer generated from the full retrieved context
    Success,
    /// Answer generated, but with truncated or absent context
    Partial,
    /// No answer; see the error classification
    Failure,
}

/// Client-facing failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Bad input, client-caused, not retriable
    InvalidQuery,
    /// Retrieval-stage capability failure
    EmbeddingUnavailable,
    /// Synthesis-stage capability failure
    GenerationFailed,
    /// A stage exceeded its deadline
    Timeout,
}

/// Metadata about one pipeline invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Number of chunks retrieved
    pub chunks_retrieved: usize,
    /// Characters of context included in the prompt
    pub context_chars: usize,
    /// Estimated tokens of context included in the prompt
    pub context_tokens: usize,
    /// Whether chunks were dropped to meet the context budget
    pub context_truncated: bool,
    /// Time taken for retrieval (ms)
    pub retrieval_time_ms: u64,
    /// Time taken for generation (ms)
    pub generation_time_ms: u64,
    /// Completion model used, if generation was reached
    pub model_used: Option<String>,
}

/// The only artifact returned across the system boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// Generated answer, empty on failure
    pub answer: String,
    /// Outcome status
    pub status: AnswerStatus,
    /// Failure classification, present only when status is Failure
    pub error: Option<FailureKind>,
    /// Source identifiers of the chunks used, in rank order
    pub sources: Vec<String>,
    /// Observability metadata
    pub metadata: ResponseMetadata,
}

impl AnswerResponse {
    /// Build a well-formed failure response
    pub fn failure(kind: FailureKind, metadata: ResponseMetadata) -> Self {
        Self {
            answer: String::new(),
            status: AnswerStatus::Failure,
            error: Some(kind),
            sources: Vec::new(),
            metadata,
        }
    }
}

/// Error types for the query pipeline
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Embedding capability unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("{stage} stage timed out after {timeout_ms}ms")]
    Timeout { stage: Stage, timeout_ms: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(Box<docqa_core::DocqaError>),
}

/// Pipeline stage, used to attribute timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieval,
    Generation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Retrieval => write!(f, "retrieval"),
            Stage::Generation => write!(f, "generation"),
        }
    }
}

impl From<docqa_core::DocqaError> for RagError {
    fn from(err: docqa_core::DocqaError) -> Self {
        RagError::Core(Box::new(err))
    }
}

pub type RagResult<T> = Result<T, RagError>;
