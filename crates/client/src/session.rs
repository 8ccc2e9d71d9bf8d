use serde::Deserialize;

use stockroom_auth::{Role, UserProfile};

/// Result of a successful login: the bearer token and who it belongs to.
///
/// Dropping the value is the client side of logging out. Call
/// [`ApiClient::logout`](crate::ApiClient::logout) first to revoke the token on
/// the server as well.
#[derive(Clone, Deserialize)]
pub struct Session {
    token: String,
    user: UserProfile,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

// Token stays out of logs.
impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
