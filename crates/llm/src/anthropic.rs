//! Anthropic Claude API Implementation
//!
//! Calls the Anthropic Messages API (https://api.anthropic.com/v1/messages)
//! with `stream: true` and decodes the server-sent event body as it arrives.

use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::sse::{EventStreamDecoder, SseEvent};
use crate::{CompletionRequest, CompletionResponse, LlmConfig, LlmError, LlmRole, LlmService};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API request body
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<MessageBody>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    role: &'static str,
    content: String,
}

/// Payload of every streamed event; only the fields we act on
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamPayload {
    MessageStart {
        message: StartedMessage,
    },
    ContentBlockDelta {
        delta: BlockDelta,
    },
    MessageDelta {
        delta: MessageDeltaBody,
    },
    MessageStop,
    Error {
        error: ApiError,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct StartedMessage {
    model: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaBody {
    stop_reason: Option<String>,
}

/// Anthropic API error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Accumulates one streamed reply
struct StreamState {
    content: String,
    model: String,
    stop_reason: Option<String>,
    finished: bool,
}

impl StreamState {
    fn new(model: String) -> Self {
        Self {
            content: String::new(),
            model,
            stop_reason: None,
            finished: false,
        }
    }

    /// Apply one decoded event, forwarding any text fragment
    fn apply(
        &mut self,
        event: &SseEvent,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<(), LlmError> {
        let payload: StreamPayload = serde_json::from_str(&event.data).map_err(|e| {
            LlmError::Stream(format!("Malformed {} event: {}", event.event, e))
        })?;

        match payload {
            StreamPayload::MessageStart { message } => self.model = message.model,
            StreamPayload::ContentBlockDelta {
                delta: BlockDelta::TextDelta { text },
            } => {
                if !text.is_empty() {
                    on_chunk(&text);
                    self.content.push_str(&text);
                }
            }
            StreamPayload::MessageDelta { delta } => {
                if delta.stop_reason.is_some() {
                    self.stop_reason = delta.stop_reason;
                }
            }
            StreamPayload::MessageStop => self.finished = true,
            StreamPayload::Error { error } => {
                if error.error_type == "rate_limit_error" {
                    return Err(LlmError::RateLimit);
                }
                return Err(LlmError::Stream(format!(
                    "Anthropic stream error ({}): {}",
                    error.error_type, error.message
                )));
            }
            StreamPayload::ContentBlockDelta {
                delta: BlockDelta::Other,
            }
            | StreamPayload::Other => {}
        }

        Ok(())
    }
}

/// Anthropic LLM service implementation
pub struct AnthropicService {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

impl AnthropicService {
    /// Create a new Anthropic service
    pub fn new(config: LlmConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            client: Client::new(),
            config,
            base_url,
        }
    }

    /// Split history into Anthropic's top-level `system` string and turns
    fn build_body(&self, request: CompletionRequest) -> MessagesRequest {
        let model = if request.model.is_empty() {
            self.config.default_model.clone()
        } else {
            request.model
        };

        let mut system: Vec<String> = Vec::new();
        let mut messages = Vec::with_capacity(request.messages.len());
        for message in request.messages {
            match message.role {
                LlmRole::System => system.push(message.content),
                LlmRole::User => messages.push(MessageBody {
                    role: "user",
                    content: message.content,
                }),
                LlmRole::Assistant => messages.push(MessageBody {
                    role: "assistant",
                    content: message.content,
                }),
            }
        }

        MessagesRequest {
            model,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages,
            temperature: request.temperature.unwrap_or(self.config.temperature),
            stream: true,
        }
    }
}

#[async_trait::async_trait]
impl LlmService for AnthropicService {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<CompletionResponse, LlmError> {
        let body = self.build_body(request);
        let url = format!("{}/v1/messages", self.base_url);

        tracing::debug!(
            model = %body.model,
            max_tokens = body.max_tokens,
            turns = body.messages.len(),
            "Sending Anthropic streaming request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimit);
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_body) {
                return Err(LlmError::Response(format!(
                    "Anthropic API error ({}): {}",
                    error_response.error.error_type, error_response.error.message
                )));
            }

            return Err(LlmError::Response(format!(
                "Anthropic API returned {}: {}",
                status, error_body
            )));
        }

        let mut state = StreamState::new(body.model);
        let mut decoder = EventStreamDecoder::new();
        let mut bytes = response.bytes_stream();

        while let Some(chunk) = bytes.next().await {
            let chunk =
                chunk.map_err(|e| LlmError::Stream(format!("Connection interrupted: {}", e)))?;

            for event in decoder.push(&chunk)? {
                state.apply(&event, on_chunk)?;
            }

            if state.finished {
                break;
            }
        }

        if !state.finished {
            return Err(LlmError::Stream(
                "Stream ended before message_stop".to_string(),
            ));
        }

        tracing::debug!(
            model = %state.model,
            output_len = state.content.len(),
            "Anthropic stream completed"
        );

        Ok(CompletionResponse {
            content: state.content,
            model: state.model,
            stop_reason: state.stop_reason.unwrap_or_else(|| "end_turn".to_string()),
        })
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
