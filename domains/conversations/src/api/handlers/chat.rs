//! Streaming chat handler

use std::convert::Infallible;

use alloychat_auth::AuthUser;
use alloychat_common::{Result, ValidatedJson};
use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
};
use futures_util::StreamExt;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::domain::relay::{ExchangeRequest, RelayFrame};

/// Request body for `POST /v1/chat/stream`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatStreamRequest {
    pub conversation_id: Option<Uuid>,

    pub title: Option<String>,

    /// Missing content is reported by the relay as "content required"
    #[serde(default)]
    #[validate(length(max = 32000))]
    pub content: String,
}

impl From<ChatStreamRequest> for ExchangeRequest {
    fn from(req: ChatStreamRequest) -> Self {
        Self {
            conversation_id: req.conversation_id,
            title: req.title,
            content: req.content,
        }
    }
}

/// Render one relay frame as an SSE event
fn frame_event(frame: &RelayFrame) -> Event {
    match frame.payload() {
        Some(payload) => Event::default().data(payload.to_string()),
        None => Event::default().comment("keep-alive"),
    }
}

/// Send a message and stream the assistant reply (SSE)
///
/// Validation, not-found and ownership failures are returned as ordinary
/// JSON errors; once the stream opens, failures arrive as `error` events.
pub async fn stream_chat(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<ChatStreamRequest>,
) -> Result<Response> {
    let exchange = state
        .relay
        .open(ctx.current_user_id(), req.into())
        .await?;

    let events = state
        .relay
        .into_stream(exchange)
        .map(|frame| Ok::<_, Infallible>(frame_event(&frame)));

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(events),
    )
        .into_response())
}
