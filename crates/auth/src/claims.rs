//! JWT claims types

use serde::{Deserialize, Serialize};

use crate::types::AuthRole;

/// Access token claims issued by the login service
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Application role; absent on tokens minted before roles existed
    #[serde(default)]
    pub role: AuthRole,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
}
