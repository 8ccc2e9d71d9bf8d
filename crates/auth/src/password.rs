//! Password hashing and verification (bcrypt).
//!
//! These calls are CPU-bound; async callers should run them on a blocking
//! thread.

use std::sync::{Arc, OnceLock};

use thiserror::Error;

pub use bcrypt::DEFAULT_COST;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    bcrypt::hash(password, cost).map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Check `password` against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch, not an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

/// Stand-in hash checked for usernames that do not exist, so response time
/// does not reveal which usernames are valid.
///
/// Must be built with the same cost as real account hashes. The hash itself is
/// computed on first use, on whatever thread runs the first check.
#[derive(Debug, Clone)]
pub struct DummyHash {
    cost: u32,
    hash: Arc<OnceLock<String>>,
}

impl DummyHash {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            hash: Arc::new(OnceLock::new()),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Burn the same amount of work as checking a real hash at this cost.
    pub fn verify(&self, password: &str) {
        let hash = self.hash.get_or_init(|| {
            bcrypt::hash("stockroom-dummy-password", self.cost).unwrap_or_default()
        });
        let _ = bcrypt::verify(password, hash);
    }
}
