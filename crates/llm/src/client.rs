//! Directive-injecting completion client
//!
//! Second, model-side layer of domain restriction: every request carries the
//! metals-and-alloys persona and its refusal instruction, independent of any
//! keyword filtering done before the call.

use std::sync::Arc;

use crate::{CompletionRequest, LlmError, LlmMessage, LlmRole, LlmService};

/// Fixed system directive prepended to every conversation
pub const SYSTEM_DIRECTIVE: &str = "You are Alloychat, a materials engineer specialising in \
metals and alloys: their compositions, grades and designations, mechanical and physical \
properties, heat treatment, machining, joining, corrosion and selection for engineering \
applications. Answer precisely and cite typical values with units. If a question is not \
about metals, alloys or their processing, politely decline and explain that you only \
answer metals and alloys questions.";

/// Per-call overrides; `None` falls back to the provider's configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Caller-facing completion client
#[derive(Clone)]
pub struct CompletionClient {
    service: Arc<dyn LlmService>,
    directive: String,
}

impl CompletionClient {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self::with_directive(service, SYSTEM_DIRECTIVE)
    }

    pub fn with_directive(service: Arc<dyn LlmService>, directive: impl Into<String>) -> Self {
        Self {
            service,
            directive: directive.into(),
        }
    }

    /// Stream a completion for `history`, forwarding each fragment to `on_chunk`.
    ///
    /// Returns the fully assembled text. Any upstream failure aborts the call;
    /// nothing is retried here.
    pub async fn stream_completion(
        &self,
        history: Vec<LlmMessage>,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
        options: CompletionOptions,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: options.model.unwrap_or_default(),
            messages: self.with_system_directive(history),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self.service.stream_completion(request, on_chunk).await?;
        Ok(response.content)
    }

    fn with_system_directive(&self, history: Vec<LlmMessage>) -> Vec<LlmMessage> {
        if history.first().map(|m| m.role) == Some(LlmRole::System) {
            return history;
        }

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(LlmMessage::system(self.directive.clone()));
        messages.extend(history);
        messages
    }
}
