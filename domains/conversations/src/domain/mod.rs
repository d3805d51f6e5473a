//! Domain layer for Conversations

pub mod entities;
pub mod gate;
pub mod relay;
pub mod state;
