//! Answer synthesis
//!
//! Assembles the prompt from the query and retrieved context, invokes the
//! completion capability exactly once, and produces the response artifact.
//! Multi-step agentic loops are deliberately out: one request, one prompt,
//! one completion.

use crate::prompt::PromptBuilder;
use crate::providers::CompletionProvider;
use crate::token_counter::{get_context_limit, TokenCounter};
use crate::types::{
    AnswerResponse, AnswerStatus, Query, RagError, RagResult, ResponseMetadata, RetrievalResult,
    Stage,
};
use docqa_core::{with_timeout, DocqaError, GenerationConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Synthesizes an answer from a query and its retrieved context
pub struct AnswerSynthesizer {
    llm: Arc<dyn CompletionProvider>,
    config: GenerationConfig,
    token_counter: TokenCounter,
    gen_timeout_ms: u64,
}

impl AnswerSynthesizer {
    /// Create a new synthesizer over a shared completion handle
    pub fn new(
        llm: Arc<dyn CompletionProvider>,
        config: GenerationConfig,
        gen_timeout_ms: u64,
    ) -> RagResult<Self> {
        let token_counter = TokenCounter::for_model(llm.model())?;

        Ok(Self {
            llm,
            config,
            token_counter,
            gen_timeout_ms,
        })
    }

    /// Generate an answer grounded in `context`.
    ///
    /// Context that exceeds the character budget loses its lowest-ranked
    /// chunks first, never part of a chunk; the truncation is recorded on
    /// the response metadata and logged. Empty context produces a prompt
    /// that explicitly says no context was found. Status is `Partial`
    /// whenever the answer was generated with truncated or absent context.
    pub async fn synthesize(
        &self,
        query: &Query,
        context: RetrievalResult,
    ) -> RagResult<AnswerResponse> {
        let chunks_retrieved = context.len();
        let builder = PromptBuilder::new(&self.config);

        let (fitted, truncated) = builder.fit_to_budget(context);
        let sources: Vec<String> = fitted.iter().map(|c| c.source.clone()).collect();
        let context_chars: usize = fitted.iter().map(|c| c.content.len()).sum();
        let context_tokens: usize = fitted
            .iter()
            .map(|c| self.token_counter.count_tokens(&c.content))
            .sum();

        let mut request = builder.build(query, &fitted);
        request.context_truncated = truncated;

        let prompt_tokens = self.token_counter.count_tokens(&request.prompt);
        if prompt_tokens > get_context_limit(self.token_counter.model_name()) {
            warn!(
                query_id = %query.id,
                prompt_tokens,
                model = self.token_counter.model_name(),
                "Prompt exceeds the model's context limit"
            );
        }

        debug!(
            query_id = %query.id,
            chunks_used = request.chunks_used,
            context_chars,
            context_tokens,
            context_truncated = request.context_truncated,
            no_context = request.no_context,
            "Prepared answer request"
        );

        let generation_start = Instant::now();
        let answer = match with_timeout(
            self.llm.complete(&self.config.system_prompt, &request.prompt),
            self.gen_timeout_ms,
            "generate_answer",
        )
        .await
        {
            Ok(result) => result?,
            Err(DocqaError::Timeout { duration_ms, .. }) => {
                return Err(RagError::Timeout {
                    stage: Stage::Generation,
                    timeout_ms: duration_ms,
                });
            }
            Err(other) => return Err(other.into()),
        };
        let generation_time = generation_start.elapsed();

        let status = if truncated || request.no_context {
            AnswerStatus::Partial
        } else {
            AnswerStatus::Success
        };

        info!(
            query_id = %query.id,
            status = ?status,
            answer_chars = answer.len(),
            elapsed_ms = generation_time.as_millis() as u64,
            "Generated answer"
        );

        Ok(AnswerResponse {
            answer,
            status,
            error: None,
            sources,
            metadata: ResponseMetadata {
                chunks_retrieved,
                context_chars,
                context_tokens,
                context_truncated: truncated,
                retrieval_time_ms: 0,
                generation_time_ms: generation_time.as_millis() as u64,
                model_used: Some(self.llm.model().to_string()),
            },
        })
    }
}
