//! Auth read-model types

use serde::{Deserialize, Serialize};

/// Application role carried in the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthRole {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for AuthRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthRole::User => write!(f, "user"),
            AuthRole::Admin => write!(f, "admin"),
        }
    }
}
