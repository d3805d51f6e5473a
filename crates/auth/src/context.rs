//! Authorization context for authenticated users

use uuid::Uuid;

use crate::types::AuthRole;

/// Identity of the caller, resolved from a validated access token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: AuthRole,
}

impl AuthContext {
    pub fn new(user_id: Uuid, email: Option<String>, role: AuthRole) -> Self {
        Self {
            user_id,
            email,
            role,
        }
    }

    /// The authenticated caller's user ID
    pub fn current_user_id(&self) -> Uuid {
        self.user_id
    }

    /// Check if the caller owns a resource held by `owner_id`
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}
