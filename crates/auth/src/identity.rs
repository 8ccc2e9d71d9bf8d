use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

use crate::Role;

/// Authenticated identity carried by a session token.
///
/// This is everything downstream authorization needs; it is decoded from the
/// token without touching the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

/// Stored user record (credential store row).
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

// Hand-written so the hash never ends up in logs.
impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("name", &self.name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Public view of a user (login response, audit joins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_omits_password_hash() {
        let user = User {
            id: UserId::new(1),
            username: "admin".to_string(),
            password_hash: "$2b$04$secretsecretsecret".to_string(),
            name: "Admin User".to_string(),
            role: Role::Admin,
        };

        let rendered = format!("{user:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("secretsecret"));
    }
}
