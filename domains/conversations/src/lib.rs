//! Conversations domain: chat threads, messages, domain gate and the
//! streaming relay that ties them to the completion service

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Conversation, Message, MessageRole, MAX_TITLE_CHARS};
pub use domain::gate::{DomainGate, GateVerdict};
pub use domain::relay::{ExchangeRequest, OpenExchange, RelayFrame, RelaySettings, StreamRelay};
pub use domain::state::{
    ExchangeEvent, ExchangeState, ExchangeStateMachine, ExchangeTracker, StateError,
};

// Re-export repository types
pub use repository::{
    ConversationRepository, ConversationStore, MessageRepository, PgConversationStore,
};
#[cfg(any(test, feature = "test-support"))]
pub use repository::{InMemoryConversationStore, StoreOp};

// Re-export API types
pub use api::routes::routes;
pub use api::ConversationsState;
