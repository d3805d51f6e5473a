//! Shared utilities, configuration, and error handling for Alloychat
//!
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - Database pool lifecycle
//! - Request extractors

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::Config;
pub use db::{Database, RepositoryError};
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;
