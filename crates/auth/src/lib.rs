//! `stockroom-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it signs and
//! checks session tokens, hashes passwords and evaluates the role policy, but
//! never looks a user up by itself.

pub mod authorize;
pub mod claims;
pub mod denylist;
pub mod identity;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod token;

pub use authorize::{authorize, granted_operations, AuthzError};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use denylist::TokenDenylist;
pub use identity::{Identity, User, UserProfile};
pub use password::{hash_password, verify_password, DummyHash, PasswordError, DEFAULT_COST};
pub use permissions::Operation;
pub use roles::Role;
pub use token::{Hs256SessionKeys, IssuedToken, JwtValidator, TokenError, DEFAULT_TOKEN_TTL_HOURS};
