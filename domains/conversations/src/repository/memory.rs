//! In-memory store for tests
//!
//! Mirrors the Postgres semantics (cascade delete, `updated_at` bump on
//! append, monotonic message ids) and records every mutating call in a
//! journal so tests can assert persistence ordering.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::ConversationStore;
use crate::domain::entities::{Conversation, Message, MessageRole};
use alloychat_common::{Error, Pagination, Result};

/// One mutating store call, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    CreateConversation(Uuid),
    AppendMessage {
        conversation_id: Uuid,
        role: MessageRole,
    },
    DeleteConversation(Uuid),
}

#[derive(Default)]
struct Inner {
    conversations: HashMap<Uuid, Conversation>,
    /// Activity counter per conversation; breaks `updated_at` ties
    activity: HashMap<Uuid, u64>,
    messages: Vec<Message>,
    next_message_id: i64,
    clock: u64,
    journal: Vec<StoreOp>,
    /// Appends allowed before the store starts failing
    append_budget: Option<usize>,
    /// Latency added to history reads
    read_delay: Option<Duration>,
}

impl Inner {
    fn touch(&mut self, id: Uuid) {
        self.clock += 1;
        self.activity.insert(id, self.clock);
    }
}

#[derive(Clone, Default)]
pub struct InMemoryConversationStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Let `count` more appends succeed, then fail every append as if the
    /// pool were unreachable
    pub fn fail_appends_after(&self, count: usize) {
        self.lock().append_budget = Some(count);
    }

    /// Make every history read take `delay`, like a slow query
    pub fn delay_reads(&self, delay: Duration) {
        self.lock().read_delay = Some(delay);
    }

    pub fn journal(&self) -> Vec<StoreOp> {
        self.lock().journal.clone()
    }

    /// Every stored message across all conversations, in insertion order
    pub fn all_messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn conversation_count(&self) -> usize {
        self.lock().conversations.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(&self, user_id: Uuid, title: String) -> Result<Conversation> {
        let conversation = Conversation::new(user_id, title)?;
        let mut inner = self.lock();
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        inner.touch(conversation.id);
        inner
            .journal
            .push(StoreOp::CreateConversation(conversation.id));
        Ok(conversation)
    }

    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.lock().conversations.get(&id).cloned())
    }

    async fn conversation_owner(&self, id: Uuid) -> Result<Option<Uuid>> {
        Ok(self.lock().conversations.get(&id).map(|c| c.user_id))
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message> {
        Message::validate_content(content)?;

        let mut inner = self.lock();
        if let Some(budget) = inner.append_budget.as_mut() {
            if *budget == 0 {
                return Err(Error::Database(sqlx::Error::PoolTimedOut));
            }
            *budget -= 1;
        }

        let now = Utc::now();
        match inner.conversations.get_mut(&conversation_id) {
            Some(conversation) => conversation.updated_at = now,
            None => return Err(Error::NotFound("Conversation not found".to_string())),
        }
        inner.touch(conversation_id);

        inner.next_message_id += 1;
        let message = Message {
            id: inner.next_message_id,
            conversation_id,
            role,
            content: content.to_string(),
            created_at: now,
        };
        inner.messages.push(message.clone());
        inner.journal.push(StoreOp::AppendMessage {
            conversation_id,
            role,
        });
        Ok(message)
    }

    async fn recent_messages(&self, conversation_id: Uuid, limit: i64) -> Result<Vec<Message>> {
        let delay = self.lock().read_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let inner = self.lock();
        let history: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();

        if limit <= 0 {
            return Ok(history);
        }
        let skip = history.len().saturating_sub(limit as usize);
        Ok(history.into_iter().skip(skip).collect())
    }

    async fn list_conversations(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Conversation>> {
        let inner = self.lock();
        let mut owned: Vec<&Conversation> = inner
            .conversations
            .values()
            .filter(|c| c.user_id == user_id)
            .collect();
        owned.sort_by_key(|c| std::cmp::Reverse(inner.activity.get(&c.id).copied()));

        Ok(owned
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .cloned()
            .collect())
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.lock();
        if inner.conversations.remove(&id).is_none() {
            return Ok(false);
        }
        inner.activity.remove(&id);
        inner.messages.retain(|m| m.conversation_id != id);
        inner.journal.push(StoreOp::DeleteConversation(id));
        Ok(true)
    }
}
