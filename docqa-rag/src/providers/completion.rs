//! Completion provider trait for answer generation

use crate::types::RagResult;
use async_trait::async_trait;

/// Trait for LLM-based text completion
///
/// Implementations:
/// - `OpenAiCompletion`: OpenAI-compatible `/chat/completions` endpoint
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for a prompt under a fixed system instruction
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> RagResult<String>;

    /// Get the model being used
    fn model(&self) -> &str;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
