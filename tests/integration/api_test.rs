//! API endpoint integration tests
//!
//! Drives the full router (auth, chat stream, conversation history) over an
//! in-memory store and the mock completion provider.

#![allow(dead_code)]

mod chat;
mod common;
mod conversations;
