//! Session tokens: HS256-signed JWTs carrying an [`Identity`].
//!
//! Signature checking lives here; time-window checks are delegated to
//! [`validate_claims`] so tests can drive the clock explicitly.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{validate_claims, Identity, JwtClaims, TokenValidationError};

/// Default session lifetime.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No bearer token was presented.
    #[error("access token required")]
    Missing,

    /// Bad signature, malformed token, or an impossible time window.
    #[error("invalid token")]
    Invalid,

    #[error("token has expired")]
    Expired,

    /// The token id was revoked by logout.
    #[error("token has been revoked")]
    Revoked,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                TokenError::Invalid
            }
        }
    }
}

/// A freshly signed token plus the claims it carries.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(skip)]
    pub claims: JwtClaims,
}

/// Decodes and verifies a bearer token.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Process-wide HS256 signing key plus the session lifetime.
#[derive(Clone)]
pub struct Hs256SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256SessionKeys {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self::with_ttl(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    pub fn with_ttl(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `identity`, valid from `now` for the configured lifetime.
    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let claims = JwtClaims {
            sub: identity.user_id,
            username: identity.username.clone(),
            role: identity.role,
            jti: Uuid::now_v7(),
            issued_at: now,
            expires_at: now + self.ttl,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    fn validation() -> Validation {
        // Expiry is checked by `validate_claims` against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation
    }
}

impl JwtValidator for Hs256SessionKeys {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = decode::<JwtClaims>(token, &self.decoding, &Self::validation()).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            TokenError::Invalid
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for Hs256SessionKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256SessionKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use stockroom_core::UserId;

    fn controller() -> Identity {
        Identity {
            user_id: UserId::new(2),
            username: "controller".to_string(),
            role: Role::StockController,
        }
    }

    #[test]
    fn issued_token_validates_back_to_the_same_identity() {
        let keys = Hs256SessionKeys::new("test-secret");
        let now = Utc::now();
        let issued = keys.issue(&controller(), now).unwrap();

        let claims = keys.validate(&issued.token, now).unwrap();
        assert_eq!(claims.identity(), controller());
        assert_eq!(claims.expires_at - claims.issued_at, Duration::hours(8));
    }

    #[test]
    fn wrong_key_is_invalid() {
        let keys = Hs256SessionKeys::new("test-secret");
        let other = Hs256SessionKeys::new("another-secret");
        let now = Utc::now();
        let issued = other.issue(&controller(), now).unwrap();

        assert_eq!(keys.validate(&issued.token, now), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_invalid() {
        let keys = Hs256SessionKeys::new("test-secret");
        assert_eq!(keys.validate("not.a.jwt", Utc::now()), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_after_ttl() {
        let keys = Hs256SessionKeys::with_ttl("test-secret", Duration::minutes(30));
        let now = Utc::now();
        let issued = keys.issue(&controller(), now).unwrap();

        assert_eq!(
            keys.validate(&issued.token, now + Duration::minutes(31)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn every_token_gets_a_distinct_id() {
        let keys = Hs256SessionKeys::new("test-secret");
        let now = Utc::now();
        let a = keys.issue(&controller(), now).unwrap();
        let b = keys.issue(&controller(), now).unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
    }
}
