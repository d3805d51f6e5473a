//! Stream relay: one chat exchange from inbound message to closed stream
//!
//! The exchange is split in two halves. [`StreamRelay::open`] runs every
//! step that can still fail with an ordinary HTTP error (validation,
//! ownership, inbound persistence, gating). [`StreamRelay::into_stream`]
//! turns the opened exchange into a single generator that owns the
//! heartbeat, the completion call and the reply accumulator. Dropping the
//! generator drops all three at once.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures_core::Stream;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use alloychat_common::{Error, Result};
use alloychat_llm::{CompletionClient, CompletionOptions, LlmError, LlmMessage};

use super::entities::{Conversation, Message, MessageRole};
use super::gate::{DomainGate, GateVerdict};
use super::state::{ExchangeEvent, ExchangeState, ExchangeTracker};
use crate::repository::ConversationStore;

/// Tuning for the relay
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Period of the `: keep-alive` comment once the stream is open
    pub heartbeat_interval: Duration,
    /// Prior messages sent as context; `<= 0` sends the whole conversation
    pub context_window: i64,
    pub options: CompletionOptions,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(15),
            context_window: 10,
            options: CompletionOptions::default(),
        }
    }
}

/// Inbound chat message
#[derive(Debug, Clone, Default)]
pub struct ExchangeRequest {
    pub conversation_id: Option<Uuid>,
    pub title: Option<String>,
    pub content: String,
}

/// An exchange whose inbound message is stored and gated, ready to stream
#[derive(Debug)]
pub struct OpenExchange {
    pub conversation_id: Uuid,
    pub user_message: Message,
    pub verdict: GateVerdict,
    tracker: ExchangeTracker,
}

impl OpenExchange {
    pub fn state(&self) -> ExchangeState {
        self.tracker.state()
    }
}

/// One unit of output on the client stream
#[derive(Debug, Clone, PartialEq)]
pub enum RelayFrame {
    Started { conversation_id: Uuid },
    Chunk(String),
    Done { conversation_id: Uuid, message_id: i64 },
    Error(String),
    KeepAlive,
}

impl RelayFrame {
    /// JSON carried in the `data:` line; `None` for comment-only frames
    pub fn payload(&self) -> Option<Value> {
        match self {
            RelayFrame::Started { conversation_id } => Some(json!({
                "started": true,
                "conversationId": conversation_id,
            })),
            RelayFrame::Chunk(text) => Some(json!({ "chunk": text })),
            RelayFrame::Done {
                conversation_id,
                message_id,
            } => Some(json!({
                "done": true,
                "conversationId": conversation_id,
                "messageId": message_id,
            })),
            RelayFrame::Error(message) => Some(json!({ "error": message })),
            RelayFrame::KeepAlive => None,
        }
    }

    /// True for frames after which nothing else is emitted
    pub fn is_final(&self) -> bool {
        matches!(self, RelayFrame::Done { .. } | RelayFrame::Error(_))
    }
}

enum Step {
    Chunk(String),
    Finished(std::result::Result<String, LlmError>),
    KeepAlive,
}

#[derive(Clone)]
pub struct StreamRelay {
    store: Arc<dyn ConversationStore>,
    client: CompletionClient,
    gate: DomainGate,
    settings: RelaySettings,
}

impl StreamRelay {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        client: CompletionClient,
        gate: DomainGate,
        settings: RelaySettings,
    ) -> Self {
        Self {
            store,
            client,
            gate,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Validate, authorize, persist the inbound message and gate it.
    ///
    /// Nothing has been sent to the client yet, so every failure here is an
    /// ordinary error response.
    pub async fn open(&self, user_id: Uuid, request: ExchangeRequest) -> Result<OpenExchange> {
        if request.content.trim().is_empty() {
            return Err(Error::Validation("content required".to_string()));
        }

        let mut tracker = ExchangeTracker::new();
        tracker.apply(ExchangeEvent::Receive)?;

        let conversation_id = match request.conversation_id {
            None => {
                let title = Conversation::resolve_title(request.title.as_deref(), &request.content);
                let conversation = self.store.create_conversation(user_id, title).await?;
                tracing::info!(conversation_id = %conversation.id, "Conversation created");
                conversation.id
            }
            Some(id) => match self.store.conversation_owner(id).await? {
                None => return Err(Error::NotFound("Conversation not found".to_string())),
                Some(owner) if owner != user_id => {
                    tracing::warn!(conversation_id = %id, %user_id, "Rejected non-owner exchange");
                    return Err(Error::Authorization(
                        "Not the owner of this conversation".to_string(),
                    ));
                }
                Some(_) => id,
            },
        };
        tracker.apply(ExchangeEvent::Authorize)?;

        let user_message = self
            .store
            .append_message(conversation_id, MessageRole::User, &request.content)
            .await?;
        tracker.apply(ExchangeEvent::InboundPersisted)?;

        let verdict = self.gate.evaluate(&request.content);
        tracker.apply(match verdict {
            GateVerdict::Allowed => ExchangeEvent::Allow,
            GateVerdict::Blocked => ExchangeEvent::Block,
        })?;

        tracing::debug!(%conversation_id, ?verdict, "Exchange opened");

        Ok(OpenExchange {
            conversation_id,
            user_message,
            verdict,
            tracker,
        })
    }

    /// Event stream for an opened exchange: `started`, `chunk`*, then
    /// exactly one of `done` or `error`, with keep-alives interleaved.
    pub fn into_stream(
        &self,
        exchange: OpenExchange,
    ) -> impl Stream<Item = RelayFrame> + Send + 'static {
        let store = self.store.clone();
        let client = self.client.clone();
        let settings = self.settings.clone();

        stream! {
            let OpenExchange { conversation_id, user_message, verdict, mut tracker } = exchange;

            yield RelayFrame::Started { conversation_id };

            let period = settings.heartbeat_interval;
            let mut heartbeat = interval_at(Instant::now() + period, period);
            heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let reply: std::result::Result<String, String> = match verdict {
                GateVerdict::Blocked => {
                    yield RelayFrame::Chunk(DomainGate::REFUSAL.to_string());
                    Ok(DomainGate::REFUSAL.to_string())
                }
                GateVerdict::Allowed => {
                    let context = build_context(store.as_ref(), &user_message, settings.context_window);
                    tokio::pin!(context);
                    let loaded = loop {
                        let tick = tokio::select! {
                            result = &mut context => Some(result),
                            _ = heartbeat.tick() => None,
                        };
                        match tick {
                            Some(result) => break result,
                            None => yield RelayFrame::KeepAlive,
                        }
                    };

                    match loaded {
                        Err(e) => {
                            tracing::error!(error = %e, %conversation_id, "Failed to load context");
                            Err("failed to load conversation history".to_string())
                        }
                        Ok(history) => {
                            let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel::<String>();
                            let options = settings.options.clone();
                            let completion = async move {
                                let mut on_chunk = |text: &str| {
                                    // Receiver outlives the call unless the stream was dropped
                                    let _ = chunk_tx.send(text.to_string());
                                };
                                client.stream_completion(history, &mut on_chunk, options).await
                            };
                            tokio::pin!(completion);

                            let mut accumulated = String::new();
                            let outcome = loop {
                                let step = tokio::select! {
                                    biased;
                                    Some(chunk) = chunk_rx.recv() => Step::Chunk(chunk),
                                    result = &mut completion => Step::Finished(result),
                                    _ = heartbeat.tick() => Step::KeepAlive,
                                };
                                match step {
                                    Step::Chunk(chunk) => {
                                        accumulated.push_str(&chunk);
                                        yield RelayFrame::Chunk(chunk);
                                    }
                                    Step::KeepAlive => yield RelayFrame::KeepAlive,
                                    Step::Finished(result) => {
                                        while let Ok(chunk) = chunk_rx.try_recv() {
                                            accumulated.push_str(&chunk);
                                            yield RelayFrame::Chunk(chunk);
                                        }
                                        break result;
                                    }
                                }
                            };

                            match outcome {
                                Ok(_) if accumulated.trim().is_empty() => {
                                    tracing::warn!(%conversation_id, "Completion produced no text");
                                    Err("empty completion".to_string())
                                }
                                Ok(_) => Ok(accumulated),
                                Err(e) => {
                                    tracing::warn!(error = %e, %conversation_id, "Completion failed");
                                    Err("upstream error".to_string())
                                }
                            }
                        }
                    }
                }
            };

            let text = match reply {
                Ok(text) => text,
                Err(message) => {
                    advance(&mut tracker, ExchangeEvent::Fail);
                    yield RelayFrame::Error(message);
                    return;
                }
            };

            if !advance(&mut tracker, ExchangeEvent::ReplyReady) {
                yield RelayFrame::Error("exchange in invalid state".to_string());
                return;
            }

            let persist = store.append_message(conversation_id, MessageRole::Assistant, &text);
            tokio::pin!(persist);
            let persisted = loop {
                let tick = tokio::select! {
                    result = &mut persist => Some(result),
                    _ = heartbeat.tick() => None,
                };
                match tick {
                    Some(result) => break result,
                    None => yield RelayFrame::KeepAlive,
                }
            };

            match persisted {
                Ok(message) => {
                    advance(&mut tracker, ExchangeEvent::Close);
                    tracing::info!(%conversation_id, message_id = message.id, "Exchange completed");
                    yield RelayFrame::Done { conversation_id, message_id: message.id };
                }
                Err(e) => {
                    advance(&mut tracker, ExchangeEvent::Fail);
                    tracing::error!(error = %e, %conversation_id, "Failed to store assistant reply");
                    yield RelayFrame::Error("failed to store reply".to_string());
                }
            }
        }
    }
}

/// Apply `event`, logging instead of failing; returns whether it was accepted
fn advance(tracker: &mut ExchangeTracker, event: ExchangeEvent) -> bool {
    match tracker.apply(event) {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(error = %e, "Exchange state violation");
            false
        }
    }
}

/// Up to `window` prior messages, oldest first, followed by the inbound message
async fn build_context(
    store: &dyn ConversationStore,
    inbound: &Message,
    window: i64,
) -> Result<Vec<LlmMessage>> {
    let fetch = if window > 0 { window.saturating_add(1) } else { 0 };
    let mut prior: Vec<Message> = store
        .recent_messages(inbound.conversation_id, fetch)
        .await?
        .into_iter()
        .filter(|m| m.id != inbound.id)
        .collect();

    if window > 0 {
        let excess = prior.len().saturating_sub(window as usize);
        prior.drain(..excess);
    }

    let mut history: Vec<LlmMessage> = prior
        .into_iter()
        .map(|m| match m.role {
            MessageRole::User => LlmMessage::user(m.content),
            MessageRole::Assistant => LlmMessage::assistant(m.content),
        })
        .collect();
    history.push(LlmMessage::user(inbound.content.clone()));
    Ok(history)
}
