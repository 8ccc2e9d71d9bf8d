use chrono::{DateTime, Utc};
use uuid::Uuid;

use stockroom_auth::{Identity, JwtClaims, Role};
use stockroom_core::UserId;

/// Authenticated principal for a request, decoded from its bearer token.
///
/// Handlers receive this as an explicit extension; there is no ambient session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    identity: Identity,
    token_id: Uuid,
    expires_at: DateTime<Utc>,
}

impl PrincipalContext {
    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self {
            identity: claims.identity(),
            token_id: claims.jti,
            expires_at: claims.expires_at,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    pub fn role(&self) -> Role {
        self.identity.role
    }

    pub fn token_id(&self) -> Uuid {
        self.token_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
