//! Configuration loading and validation

use crate::error::{DocqaError, DocqaResult, ErrorContext};
use crate::types::{DocqaConfig, EmbeddingConfig, GenerationConfig, LlmConfig, RetrievalConfig};

use std::path::Path;

impl Default for DocqaConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key: None,
                base_url: None,
                temperature: 0.7,
                max_tokens: Some(2000),
                timeout_ms: 60_000,
            },
            embedding: EmbeddingConfig {
                provider: "openai".to_string(),
                model: "text-embedding-3-small".to_string(),
                api_key: None,
                base_url: None,
                dimension: 1536,
                timeout_ms: 30_000,
            },
            retrieval: RetrievalConfig {
                // Matches the upstream retriever default; raise for broader context
                top_k: 4,
                similarity_threshold: 0.0,
            },
            generation: GenerationConfig {
                system_prompt: "You are a helpful assistant that answers questions using the \
                                provided context. Use only the supplied context to answer. If \
                                the context does not contain the answer, say so clearly."
                    .to_string(),
                user_prompt_template: "Context:\n{context}\n\nQuestion: {question}\n\nAnswer:"
                    .to_string(),
                include_citations: true,
                max_context_chars: 12000,
            },
        }
    }
}

impl DocqaConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DocqaResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DocqaError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: DocqaConfig = toml::from_str(&content).map_err(|e| DocqaError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DocqaResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| DocqaError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| DocqaError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> DocqaResult<()> {
        if self.embedding.dimension == 0 {
            return Err(DocqaError::Config {
                message: "Embedding dimension must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set embedding.dimension to a positive value"),
            });
        }

        if self.retrieval.top_k == 0 {
            return Err(DocqaError::Config {
                message: "Retrieval top_k must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set retrieval.top_k to a positive value"),
            });
        }

        if self.generation.max_context_chars == 0 {
            return Err(DocqaError::Config {
                message: "Generation max_context_chars must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set generation.max_context_chars to a positive value"),
            });
        }

        if let Some(max_tokens) = self.llm.max_tokens {
            if max_tokens == 0 {
                return Err(DocqaError::Config {
                    message: "LLM max_tokens must be greater than 0 when set".to_string(),
                    source: None,
                    context: ErrorContext::new("config")
                        .with_operation("validate")
                        .with_suggestion("Set llm.max_tokens to a positive value or omit it"),
                });
            }
        }

        if self.llm.timeout_ms == 0 || self.embedding.timeout_ms == 0 {
            return Err(DocqaError::Config {
                message: "Capability timeouts must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set llm.timeout_ms and embedding.timeout_ms to positive values"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DocqaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut config = DocqaConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let mut config = DocqaConfig::default();
        config.embedding.dimension = 0;
        assert!(config.validate().is_err());
    }
}
