//! Core configuration type definitions
//!
//! The whole configuration for one process lives in a single [`DocqaConfig`]
//! constructed at startup and passed by reference into the components that
//! need it. Nothing reads the process environment at request time.

use serde::{Deserialize, Serialize};

/// Top-level configuration object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocqaConfig {
    /// Completion model configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embedding: EmbeddingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Generation configuration
    pub generation: GenerationConfig,
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider type (openai, etc.)
    pub provider: String,
    /// Model name
    pub model: String,
    /// API key (optional, can be set via environment)
    pub api_key: Option<String>,
    /// Base URL for custom providers
    pub base_url: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Deadline for a single completion call
    pub timeout_ms: u64,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider (openai, etc.)
    pub provider: String,
    /// Embedding model name
    pub model: String,
    /// API key for embedding service
    pub api_key: Option<String>,
    /// Base URL for custom providers
    pub base_url: Option<String>,
    /// Dimension of embeddings
    pub dimension: usize,
    /// Deadline for a single embedding call
    pub timeout_ms: u64,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of top documents to retrieve
    pub top_k: usize,
    /// Minimum similarity score for a chunk to be considered relevant
    pub similarity_threshold: f32,
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// System prompt constraining the model to the supplied context
    pub system_prompt: String,
    /// User prompt template with {context} and {question} placeholders
    pub user_prompt_template: String,
    /// Whether to attribute each chunk to its source in the prompt
    pub include_citations: bool,
    /// Character budget for the concatenated context
    pub max_context_chars: usize,
}
