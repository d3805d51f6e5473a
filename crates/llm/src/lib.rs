//! LLM service: streaming completions from the Anthropic Messages API
//!
//! `LlmService` is the provider seam; `CompletionClient` is what callers use.
//! It injects the domain directive and forwards incremental text to a callback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod anthropic;
pub mod client;
pub mod mock;
pub mod sse;

pub use anthropic::AnthropicService;
pub use client::{CompletionClient, CompletionOptions, SYSTEM_DIRECTIVE};
pub use mock::{MockLlmService, MockScript};

/// Failure talking to the upstream completion service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM stream error: {0}")]
    Stream(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,
}

/// Role of one history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

/// One history entry sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::Assistant,
            content: content.into(),
        }
    }
}

/// Provider-level streaming request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Empty means the provider's default model
    pub model: String,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Result of a completed stream
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Every forwarded fragment, concatenated in order
    pub content: String,
    pub model: String,
    pub stop_reason: String,
}

/// LLM provider configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider name (anthropic, mock)
    pub provider: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub default_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Streaming completion provider.
///
/// Implementations call `on_chunk` synchronously, in arrival order, for
/// every non-empty text fragment. They never retry.
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<CompletionResponse, LlmError>;

    fn default_model(&self) -> &str;
}

/// Builds the configured provider
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    pub fn create(config: LlmConfig) -> Result<Arc<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "anthropic" => {
                if config.api_key.is_empty() {
                    return Err(LlmError::Configuration(
                        "Anthropic provider requires an API key".to_string(),
                    ));
                }
                tracing::info!(model = %config.default_model, "Using Anthropic completion provider");
                Ok(Arc::new(AnthropicService::new(config)))
            }
            "mock" => {
                tracing::warn!("Using mock completion provider");
                Ok(Arc::new(MockLlmService::new()))
            }
            other => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}",
                other
            ))),
        }
    }
}
