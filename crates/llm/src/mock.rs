//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"` and by tests.
//! Streams deterministic replies word by word.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

/// What the mock replies with
#[derive(Debug, Clone)]
pub enum MockScript {
    /// "Mock response to: <last message>"
    Echo,
    /// A fixed reply
    Reply(String),
    /// Stream the first `chunks` fragments of `reply`, then fail
    FailAfter {
        reply: String,
        chunks: usize,
        error: LlmError,
    },
}

/// Mock LLM service for testing
#[derive(Debug, Clone)]
pub struct MockLlmService {
    script: MockScript,
    chunk_delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl MockLlmService {
    /// Create a new echoing mock
    pub fn new() -> Self {
        Self::scripted(MockScript::Echo)
    }

    pub fn scripted(script: MockScript) -> Self {
        Self {
            script,
            chunk_delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Sleep before every fragment, to exercise slow upstreams
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Number of `stream_completion` calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request received
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn pace(&self) {
        match self.chunk_delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }
}

impl Default for MockLlmService {
    fn default() -> Self {
        Self::new()
    }
}

/// Word-sized fragments that concatenate back to `text`
fn fragments(text: &str) -> Vec<&str> {
    text.split_inclusive(' ').collect()
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<CompletionResponse, LlmError> {
        tracing::info!("Mock LLM service processing streaming request");

        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        let model = if request.model.is_empty() {
            "mock-model".to_string()
        } else {
            request.model
        };

        let (reply, fail) = match &self.script {
            MockScript::Echo => {
                let last_message = request
                    .messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or("empty");
                (format!("Mock response to: {}", last_message), None)
            }
            MockScript::Reply(reply) => (reply.clone(), None),
            MockScript::FailAfter {
                reply,
                chunks,
                error,
            } => (reply.clone(), Some((*chunks, error.clone()))),
        };

        let mut content = String::new();
        for (index, fragment) in fragments(&reply).into_iter().enumerate() {
            if let Some((limit, error)) = &fail {
                if index >= *limit {
                    return Err(error.clone());
                }
            }
            self.pace().await;
            on_chunk(fragment);
            content.push_str(fragment);
        }

        if let Some((_, error)) = fail {
            return Err(error);
        }

        Ok(CompletionResponse {
            content,
            model,
            stop_reason: "end_turn".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}
