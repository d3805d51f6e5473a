//! Repository implementations for Conversations domain
//!
//! `ConversationStore` is the persistence seam used by the relay and the
//! HTTP handlers. Every call acquires and releases its own connection, so
//! nothing holds the pool across a completion call.

pub mod conversations;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod messages;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Conversation, Message, MessageRole};
use alloychat_common::{Pagination, Result};

pub use conversations::ConversationRepository;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{InMemoryConversationStore, StoreOp};
pub use messages::MessageRepository;

/// Persistence operations for conversations and their messages
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(&self, user_id: Uuid, title: String) -> Result<Conversation>;

    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;

    async fn conversation_owner(&self, id: Uuid) -> Result<Option<Uuid>>;

    /// Insert a message and bump the conversation's `updated_at` atomically
    async fn append_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message>;

    /// Last `limit` messages in ascending order; `limit <= 0` returns the full history
    async fn recent_messages(&self, conversation_id: Uuid, limit: i64) -> Result<Vec<Message>>;

    /// A user's conversations, most recently active first
    async fn list_conversations(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Conversation>>;

    /// Remove a conversation together with all of its messages
    async fn delete_conversation(&self, id: Uuid) -> Result<bool>;
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgConversationStore {
    pub conversations: ConversationRepository,
    pub messages: MessageRepository,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
        }
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn create_conversation(&self, user_id: Uuid, title: String) -> Result<Conversation> {
        let conversation = Conversation::new(user_id, title)?;
        self.conversations.create(&conversation).await
    }

    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.conversations.find(id).await
    }

    async fn conversation_owner(&self, id: Uuid) -> Result<Option<Uuid>> {
        self.conversations.owner(id).await
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message> {
        Message::validate_content(content)?;
        self.messages.append(conversation_id, role, content).await
    }

    async fn recent_messages(&self, conversation_id: Uuid, limit: i64) -> Result<Vec<Message>> {
        if limit <= 0 {
            return self.messages.list_by_conversation(conversation_id).await;
        }
        self.messages.list_recent(conversation_id, limit).await
    }

    async fn list_conversations(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Conversation>> {
        self.conversations.list_by_user(user_id, pagination).await
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        self.conversations.delete(id).await
    }
}
