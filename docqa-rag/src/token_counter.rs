//! Token counting utilities
//!
//! Accurate token counts via tiktoken-rs, used for context-size
//! observability and for sanity-checking prompts against model input
//! limits.

use crate::types::{RagError, RagResult};
use tiktoken_rs::{get_bpe_from_model, CoreBPE};
use tracing::warn;

/// Token counter for a specific model
pub struct TokenCounter {
    encoder: CoreBPE,
    model_name: String,
}

impl TokenCounter {
    /// Create a new token counter for the specified model
    pub fn new(model_name: &str) -> RagResult<Self> {
        let encoder = get_bpe_from_model(model_name).map_err(|e| {
            RagError::Config(format!(
                "Failed to get encoder for model {}: {}",
                model_name, e
            ))
        })?;

        Ok(Self {
            encoder,
            model_name: model_name.to_string(),
        })
    }

    /// Create a counter for the model, falling back to the gpt-4o encoding
    /// when the model name is unknown to tiktoken
    pub fn for_model(model_name: &str) -> RagResult<Self> {
        Self::new(model_name).or_else(|_| {
            warn!(
                model = model_name,
                "No tokenizer for model, falling back to gpt-4o encoding"
            );
            Self::new("gpt-4o")
        })
    }

    /// Count tokens in a text string
    pub fn count_tokens(&self, text: &str) -> usize {
        self.encoder.encode_with_special_tokens(text).len()
    }

    /// Get model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Context window limits for known models
pub fn get_context_limit(model_name: &str) -> usize {
    match model_name {
        "gpt-4" => 8192,
        "gpt-4-turbo" => 128000,
        "gpt-4o" => 128000,
        "gpt-4o-mini" => 128000,
        "gpt-3.5-turbo" => 16385,
        _ => {
            warn!(
                model = model_name,
                "Unknown context limit for model, using default 8192"
            );
            8192
        }
    }
}

/// Check if text fits within the model's context window
pub fn fits_in_context(text: &str, counter: &TokenCounter) -> bool {
    counter.count_tokens(text) <= get_context_limit(counter.model_name())
}
