//! Docqa RAG - the retrieval-augmented query pipeline
//!
//! Turns a free-text question into a grounded answer: the query is
//! normalized, embedded, matched against a pre-built vector index, and the
//! top-ranked chunks are stuffed into a single prompt for the completion
//! capability. The embedding function, vector index, and completion model
//! are consumed through capability traits and injected at startup.

pub mod normalizer;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod retriever;
pub mod synthesizer;
pub mod token_counter;
pub mod types;

pub use normalizer::normalize;
pub use pipeline::Pipeline;
pub use prompt::{PromptBuilder, NO_CONTEXT_MARKER};
pub use providers::{
    CompletionProvider, EmbeddingProvider, InMemoryVectorIndex, OpenAiCompletion, OpenAiEmbedder,
    VectorIndexProvider,
};
pub use retriever::DocumentRetriever;
pub use synthesizer::AnswerSynthesizer;
pub use token_counter::TokenCounter;
pub use types::{
    AnswerRequest, AnswerResponse, AnswerStatus, DocumentChunk, FailureKind, Query, RagError,
    RagResult, ResponseMetadata, RetrievalResult, Stage,
};

// Re-export the configuration objects the pipeline is wired from
pub use docqa_core::{DocqaConfig, EmbeddingConfig, GenerationConfig, LlmConfig, RetrievalConfig};
