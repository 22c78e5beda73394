/// LLM Client — the single point of entry for all model API calls.
///
/// ARCHITECTURAL RULE: No other module may call a model provider API directly.
/// All LLM interactions MUST go through a `ModelProvider` implementation.
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

/// Retry budget shared by all providers for 429s and 5xx responses.
pub(crate) const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Role of a conversation message. The system instruction travels out-of-band
/// (Anthropic puts it in a top-level field; OpenAI prepends a system message).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A text-generation backend. One completion in, one text out.
/// Implementations retry transient failures internally.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Sends the system instruction plus the conversation and returns the
    /// completion text of the first content block / choice.
    async fn complete(&self, system: &str, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;

    /// Model identifier used by this provider, for logging.
    fn model(&self) -> &'static str;
}

/// Builds the provider selected by `LLM_PROVIDER` (default: anthropic).
pub fn build_provider(config: &Config) -> Result<Arc<dyn ModelProvider>, LlmError> {
    match config.llm_provider.as_str() {
        "anthropic" => {
            let key = config.anthropic_api_key.clone().ok_or_else(|| {
                LlmError::NotConfigured("ANTHROPIC_API_KEY is not set".to_string())
            })?;
            Ok(Arc::new(AnthropicProvider::new(key)))
        }
        "openai" => {
            let key = config
                .openai_api_key
                .clone()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY is not set".to_string()))?;
            Ok(Arc::new(OpenAiProvider::new(key)))
        }
        other => Err(LlmError::NotConfigured(format!(
            "Unknown LLM_PROVIDER '{other}' (expected 'anthropic' or 'openai')"
        ))),
    }
}

/// Exponential backoff delay for a retry attempt: 1s, 2s, 4s.
pub(crate) fn backoff_delay(attempt: u32) -> std::time::Duration {
    std::time::Duration::from_millis(1000 * (1 << (attempt - 1)))
}
