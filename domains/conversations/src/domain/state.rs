//! State machine for one chat exchange
//!
//! Init → Authorizing → PersistingInbound → Gating → {Blocked | Allowed}
//!      → PersistingOutbound → Terminated
//!
//! `Failed` absorbs `Fail` from any non-terminal state.

pub use alloychat_common::StateError;
use serde::{Deserialize, Serialize};

/// Exchange states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    Init,
    Authorizing,
    PersistingInbound,
    Gating,
    Blocked,
    Allowed,
    PersistingOutbound,
    Terminated,
    Failed,
}

impl ExchangeState {
    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [ExchangeState] {
        match self {
            Self::Init => &[Self::Authorizing, Self::Failed],
            Self::Authorizing => &[Self::PersistingInbound, Self::Failed],
            Self::PersistingInbound => &[Self::Gating, Self::Failed],
            Self::Gating => &[Self::Blocked, Self::Allowed, Self::Failed],
            Self::Blocked | Self::Allowed => &[Self::PersistingOutbound, Self::Failed],
            Self::PersistingOutbound => &[Self::Terminated, Self::Failed],
            Self::Terminated | Self::Failed => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated | Self::Failed)
    }
}

impl std::fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Authorizing => write!(f, "authorizing"),
            Self::PersistingInbound => write!(f, "persisting_inbound"),
            Self::Gating => write!(f, "gating"),
            Self::Blocked => write!(f, "blocked"),
            Self::Allowed => write!(f, "allowed"),
            Self::PersistingOutbound => write!(f, "persisting_outbound"),
            Self::Terminated => write!(f, "terminated"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Events that drive an exchange forward
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExchangeEvent {
    /// Inbound request with non-empty content
    Receive,
    /// Conversation resolved and owned by the caller
    Authorize,
    /// User message stored
    InboundPersisted,
    /// Gate rejected the content
    Block,
    /// Gate accepted the content
    Allow,
    /// Full assistant reply assembled
    ReplyReady,
    /// Assistant message stored and `done` sent
    Close,
    /// Any failure
    Fail,
}

impl std::fmt::Display for ExchangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Receive => write!(f, "receive"),
            Self::Authorize => write!(f, "authorize"),
            Self::InboundPersisted => write!(f, "inbound_persisted"),
            Self::Block => write!(f, "block"),
            Self::Allow => write!(f, "allow"),
            Self::ReplyReady => write!(f, "reply_ready"),
            Self::Close => write!(f, "close"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Exchange state machine
pub struct ExchangeStateMachine;

impl ExchangeStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: ExchangeState,
        event: ExchangeEvent,
    ) -> Result<ExchangeState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (current, event) {
            (_, ExchangeEvent::Fail) => ExchangeState::Failed,
            (ExchangeState::Init, ExchangeEvent::Receive) => ExchangeState::Authorizing,
            (ExchangeState::Authorizing, ExchangeEvent::Authorize) => {
                ExchangeState::PersistingInbound
            }
            (ExchangeState::PersistingInbound, ExchangeEvent::InboundPersisted) => {
                ExchangeState::Gating
            }
            (ExchangeState::Gating, ExchangeEvent::Block) => ExchangeState::Blocked,
            (ExchangeState::Gating, ExchangeEvent::Allow) => ExchangeState::Allowed,
            (ExchangeState::Blocked | ExchangeState::Allowed, ExchangeEvent::ReplyReady) => {
                ExchangeState::PersistingOutbound
            }
            (ExchangeState::PersistingOutbound, ExchangeEvent::Close) => ExchangeState::Terminated,
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}

/// Mutable cursor over the state machine, owned by one exchange
#[derive(Debug, Clone, Copy)]
pub struct ExchangeTracker {
    state: ExchangeState,
}

impl ExchangeTracker {
    pub fn new() -> Self {
        Self {
            state: ExchangeState::Init,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn apply(&mut self, event: ExchangeEvent) -> Result<ExchangeState, StateError> {
        self.state = ExchangeStateMachine::transition(self.state, event)?;
        Ok(self.state)
    }
}

impl Default for ExchangeTracker {
    fn default() -> Self {
        Self::new()
    }
}
