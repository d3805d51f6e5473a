//! Conversation history API handlers

use alloychat_auth::{AuthContext, AuthUser};
use alloychat_common::{Error, Pagination, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::{Conversation, Message, MessageRole};

/// Conversation response DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            title: c.title,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Message response DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            role: m.role,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

/// Load a conversation the caller owns: 404 when unknown, 403 when not theirs
async fn owned_conversation(
    state: &ConversationsState,
    ctx: &AuthContext,
    id: Uuid,
) -> Result<Conversation> {
    let conv = state
        .store
        .find_conversation(id)
        .await?
        .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

    if !ctx.owns(conv.user_id) {
        return Err(Error::Authorization(
            "Not the owner of this conversation".to_string(),
        ));
    }

    Ok(conv)
}

/// List conversations for the authenticated user
pub async fn list_conversations(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<ConversationResponse>>> {
    let convs = state
        .store
        .list_conversations(ctx.current_user_id(), pagination)
        .await?;

    Ok(Json(convs.into_iter().map(Into::into).collect()))
}

/// Get a single conversation by ID
pub async fn get_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationResponse>> {
    let conv = owned_conversation(&state, &ctx, id).await?;
    Ok(Json(conv.into()))
}

/// Full message history, oldest first
pub async fn list_messages(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>> {
    owned_conversation(&state, &ctx, id).await?;

    let messages = state.store.recent_messages(id, 0).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// Delete a conversation and its messages
pub async fn delete_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    owned_conversation(&state, &ctx, id).await?;

    if !state.store.delete_conversation(id).await? {
        return Err(Error::NotFound("Conversation not found".to_string()));
    }

    tracing::info!(conversation_id = %id, "Conversation deleted");
    Ok(StatusCode::NO_CONTENT)
}
