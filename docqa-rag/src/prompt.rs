//! Prompt assembly
//!
//! Builds the single prompt handed to the completion capability: the
//! retrieved chunks in rank order, each attributed to its source, followed
//! by the question under the configured instruction template.

use crate::types::{AnswerRequest, Query, RetrievalResult};
use docqa_core::GenerationConfig;
use tracing::{debug, warn};

/// Marker inserted in place of the context block when retrieval came back
/// empty. The instruction template still constrains the model to supplied
/// context, so an ungrounded answer is flagged rather than silent.
pub const NO_CONTEXT_MARKER: &str =
    "No relevant context was found in the document collection for this question.";

/// Prompt builder bound to a generation configuration
pub struct PromptBuilder<'a> {
    config: &'a GenerationConfig,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(config: &'a GenerationConfig) -> Self {
        Self { config }
    }

    /// Keep the rank-order prefix of chunks that fits the character budget.
    ///
    /// Chunks are never split: the first chunk that would overflow the
    /// budget ends the scan, and everything after it is dropped. Returns
    /// the kept chunks and whether anything was dropped.
    pub fn fit_to_budget(&self, context: RetrievalResult) -> (RetrievalResult, bool) {
        let budget = self.config.max_context_chars;
        let original_count = context.len();

        let mut kept = Vec::new();
        let mut total_chars = 0;

        for chunk in context.into_chunks() {
            let chunk_chars = chunk.content.len();
            if total_chars + chunk_chars > budget {
                debug!(
                    budget,
                    kept = kept.len(),
                    "Stopping context assembly at character budget"
                );
                break;
            }
            total_chars += chunk_chars;
            kept.push(chunk);
        }

        let truncated = kept.len() < original_count;
        if truncated {
            warn!(
                original = original_count,
                kept = kept.len(),
                budget,
                "Dropped lower-ranked chunks to meet context budget"
            );
        }

        (RetrievalResult::from_ranked(kept), truncated)
    }

    /// Concatenate chunk texts in rank order, attributing each to its source
    fn build_context(&self, context: &RetrievalResult) -> String {
        let parts: Vec<String> = context
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                if self.config.include_citations {
                    format!("[Source {}: {}]\n{}", i + 1, chunk.source, chunk.content)
                } else {
                    chunk.content.clone()
                }
            })
            .collect();

        parts.join("\n\n---\n\n")
    }

    /// Assemble the final [`AnswerRequest`] for a budget-fitted context
    pub fn build(&self, query: &Query, context: &RetrievalResult) -> AnswerRequest {
        let no_context = context.is_empty();
        let context_block = if no_context {
            NO_CONTEXT_MARKER.to_string()
        } else {
            self.build_context(context)
        };

        let prompt = self
            .config
            .user_prompt_template
            .replace("{context}", &context_block)
            .replace("{question}", &query.text);

        AnswerRequest {
            prompt,
            chunks_used: context.len(),
            context_truncated: false,
            no_context,
        }
    }
}
