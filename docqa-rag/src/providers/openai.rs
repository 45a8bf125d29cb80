//! OpenAI-compatible capability clients
//!
//! HTTP clients for the `/embeddings` and `/chat/completions` endpoints of
//! an OpenAI-compatible service. Both are constructed once at startup from
//! the explicit configuration object; the only ambient lookup is the API
//! key environment fallback. Transient HTTP failures are retried here, not
//! in the pipeline stages.

use crate::providers::{CompletionProvider, EmbeddingProvider};
use crate::types::{RagError, RagResult};
use async_trait::async_trait;
use docqa_core::{retry_async, EmbeddingConfig, LlmConfig, RetryConfig};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

fn resolve_api_key(configured: Option<&String>) -> RagResult<String> {
    configured
        .cloned()
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .ok_or_else(|| RagError::Config("OpenAI API key not found".to_string()))
}

/// Embedding client for an OpenAI-compatible `/embeddings` endpoint
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
    retry: RetryConfig,
}

impl OpenAiEmbedder {
    /// Create a new embedder from the startup configuration
    pub fn new(config: &EmbeddingConfig) -> RagResult<Self> {
        let api_key = resolve_api_key(config.api_key.as_ref())?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        info!(
            model = %config.model,
            endpoint = %base_url,
            dimension = config.dimension,
            "Initialized OpenAI embedding client"
        );

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model: config.model.clone(),
            dimension: config.dimension,
            retry: RetryConfig::default(),
        })
    }

    /// Override the retry policy for transient HTTP failures
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        let request = EmbeddingsRequest {
            model: self.model.clone(),
            input: vec![text.to_string()],
        };

        debug!(model = %self.model, chars = text.len(), "Calling embedding API");

        let http = self.http.clone();
        let url = format!("{}/embeddings", self.base_url);
        let api_key = self.api_key.clone();

        let operation = move || {
            let http = http.clone();
            let url = url.clone();
            let api_key = api_key.clone();
            let request = request.clone();
            async move {
                let response = http
                    .post(&url)
                    .bearer_auth(&api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| {
                        RagError::EmbeddingUnavailable(format!("embedding request failed: {}", e))
                    })?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(RagError::EmbeddingUnavailable(format!(
                        "embedding service returned {}: {}",
                        status, body
                    )));
                }

                let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
                    RagError::EmbeddingUnavailable(format!("malformed embedding response: {}", e))
                })?;

                parsed
                    .data
                    .into_iter()
                    .next()
                    .map(|d| d.embedding)
                    .ok_or_else(|| {
                        RagError::EmbeddingUnavailable("no embedding data returned".to_string())
                    })
            }
            .boxed()
        };

        retry_async(operation, self.retry.clone(), "openai_embed").await
    }

    fn dimensions(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "openai-embeddings"
    }
}

/// Completion client for an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiCompletion {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    retry: RetryConfig,
}

impl OpenAiCompletion {
    /// Create a new completion client from the startup configuration
    pub fn new(config: &LlmConfig) -> RagResult<Self> {
        let api_key = resolve_api_key(config.api_key.as_ref())?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        info!(
            model = %config.model,
            endpoint = %base_url,
            "Initialized OpenAI completion client"
        );

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            retry: RetryConfig::default(),
        })
    }

    /// Override the retry policy for transient HTTP failures
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletion {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> RagResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatRequestMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatRequestMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            model = %self.model,
            prompt_chars = user_prompt.len(),
            "Calling completion API"
        );

        let http = self.http.clone();
        let url = format!("{}/chat/completions", self.base_url);
        let api_key = self.api_key.clone();

        let operation = move || {
            let http = http.clone();
            let url = url.clone();
            let api_key = api_key.clone();
            let request = request.clone();
            async move {
                let response = http
                    .post(&url)
                    .bearer_auth(&api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| {
                        RagError::GenerationFailed(format!("completion request failed: {}", e))
                    })?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(RagError::GenerationFailed(format!(
                        "completion service returned {}: {}",
                        status, body
                    )));
                }

                let parsed: ChatResponse = response.json().await.map_err(|e| {
                    RagError::GenerationFailed(format!("malformed completion response: {}", e))
                })?;

                parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .ok_or_else(|| {
                        RagError::GenerationFailed(
                            "no text content in completion response".to_string(),
                        )
                    })
            }
            .boxed()
        };

        retry_async(operation, self.retry.clone(), "openai_complete").await
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "openai-chat"
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequestMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_expected_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatRequestMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            temperature: 0.7,
            max_tokens: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn embeddings_response_parses() {
        let json = r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#;
        let parsed: EmbeddingsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data[0].embedding.len(), 3);
    }

    #[test]
    fn missing_api_key_is_config_error() {
        // Ensure neither the config nor the environment provides a key
        if std::env::var(API_KEY_ENV).is_ok() {
            return;
        }
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            base_url: None,
            dimension: 1536,
            timeout_ms: 30_000,
        };
        assert!(matches!(
            OpenAiEmbedder::new(&config),
            Err(RagError::Config(_))
        ));
    }
}
