//! Domain entities for Conversations domain
//!
//! A conversation is an owned thread; messages are immutable turns within it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alloychat_common::{Error, Result};

/// Maximum title length, in characters
pub const MAX_TITLE_CHARS: usize = 60;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Bumped on every message append
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation owned by `user_id`
    pub fn new(user_id: Uuid, title: String) -> Result<Self> {
        if title.trim().is_empty() {
            return Err(Error::Validation("Title cannot be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(Error::Validation(format!(
                "Title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }

        let now = Utc::now();
        Ok(Conversation {
            id: Uuid::new_v4(),
            user_id,
            title,
            created_at: now,
            updated_at: now,
        })
    }

    /// Default title: the first message, trimmed and cut to 60 characters
    pub fn derive_title(content: &str) -> String {
        truncate_chars(content.trim(), MAX_TITLE_CHARS)
    }

    /// Supplied title when it has visible text, otherwise derived from `content`
    pub fn resolve_title(title: Option<&str>, content: &str) -> String {
        match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => truncate_chars(t, MAX_TITLE_CHARS),
            None => Self::derive_title(content),
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => text[..byte_index].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    /// Store-wide monotonic sequence
    pub id: i64,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Validate message content (CHECK (length(trim(content)) > 0))
    pub fn validate_content(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(Error::Validation(
                "Message content cannot be empty or whitespace-only".to_string(),
            ));
        }
        Ok(())
    }
}
