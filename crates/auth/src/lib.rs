//! Authentication collaborator for the Alloychat API
//!
//! Validates bearer JWTs and exposes the caller's identity through axum
//! extractors that work with any state implementing `FromRef<S>` for
//! `AuthBackend`. Credential hashing and token issuance live elsewhere.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;
mod types;

pub use backend::AuthBackend;
pub use claims::AccessClaims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::AuthUser;
pub use types::AuthRole;
