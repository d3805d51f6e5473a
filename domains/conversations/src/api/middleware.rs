//! Conversations domain state and auth backend integration

use crate::domain::relay::StreamRelay;
use crate::repository::ConversationStore;
use alloychat_auth::AuthBackend;
use axum::extract::FromRef;
use std::sync::Arc;

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub store: Arc<dyn ConversationStore>,
    pub relay: StreamRelay,
    pub auth: AuthBackend,
}

impl ConversationsState {
    /// Build state around `relay`; handlers share its store
    pub fn new(relay: StreamRelay, auth: AuthBackend) -> Self {
        Self {
            store: relay.store().clone(),
            relay,
            auth,
        }
    }
}

impl FromRef<ConversationsState> for AuthBackend {
    fn from_ref(state: &ConversationsState) -> Self {
        state.auth.clone()
    }
}
