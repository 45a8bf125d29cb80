//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type DocqaResult<T> = Result<T, DocqaError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the docqa system
#[derive(Error, Debug)]
pub enum DocqaError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_ms: Option<u64>,
        context: ErrorContext,
    },

    #[error("LLM error: {message}")]
    Llm {
        message: String,
        provider: Option<String>,
        model: Option<String>,
        context: ErrorContext,
    },

    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        provider: Option<String>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl DocqaError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            DocqaError::Config { context, .. } => Some(context),
            DocqaError::Validation { context, .. } => Some(context),
            DocqaError::Network { context, .. } => Some(context),
            DocqaError::Timeout { context, .. } => Some(context),
            DocqaError::RateLimit { context, .. } => Some(context),
            DocqaError::Llm { context, .. } => Some(context),
            DocqaError::Embedding { context, .. } => Some(context),
            DocqaError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            DocqaError::Network { .. } => true,
            DocqaError::Timeout { .. } => true,
            DocqaError::RateLimit { .. } => true,
            DocqaError::Config { .. } => false,
            DocqaError::Validation { .. } => false,
            _ => false,
        }
    }

    /// Get retry delay in milliseconds for recoverable errors
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            DocqaError::Network { .. } => Some(1000),
            DocqaError::Timeout { .. } => Some(2000),
            DocqaError::RateLimit { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            DocqaError::Internal { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Internal error occurred"
                );
            }
            DocqaError::Config { .. } | DocqaError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            DocqaError::Network { .. } | DocqaError::Timeout { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Network or timeout error (may be recoverable)"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        DocqaError::Config {
            message: $msg.to_string(),
            source: None,
            context: ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Compare against the documented defaults"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        DocqaError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! embedding_error {
    ($msg:expr, $component:expr) => {
        DocqaError::Embedding {
            message: $msg.to_string(),
            provider: None,
            context: ErrorContext::new($component)
                .with_suggestion("Verify the embedding service is reachable"),
        }
    };
    ($msg:expr, $component:expr, $provider:expr) => {
        DocqaError::Embedding {
            message: $msg.to_string(),
            provider: Some($provider.to_string()),
            context: ErrorContext::new($component)
                .with_suggestion("Verify the embedding service is reachable"),
        }
    };
}

#[macro_export]
macro_rules! llm_error {
    ($msg:expr, $component:expr) => {
        DocqaError::Llm {
            message: $msg.to_string(),
            provider: None,
            model: None,
            context: ErrorContext::new($component)
                .with_suggestion("Verify the completion service is reachable")
                .with_suggestion("Check the configured model name"),
        }
    };
}
