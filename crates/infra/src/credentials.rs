//! Username/password verification against the user store.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use stockroom_auth::{verify_password, DummyHash, User};

use crate::store::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum CredentialError {
    /// Unknown username or wrong password; callers must not tell them apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct CredentialVerifier {
    users: Arc<dyn UserStore>,
    dummy: DummyHash,
}

impl CredentialVerifier {
    /// `bcrypt_cost` must match the cost account hashes are created with.
    pub fn new(users: Arc<dyn UserStore>, bcrypt_cost: u32) -> Self {
        Self {
            users,
            dummy: DummyHash::new(bcrypt_cost),
        }
    }

    /// Check a username/password pair. bcrypt runs on the blocking pool.
    #[instrument(skip(self, password), err(level = "debug"))]
    pub async fn verify(&self, username: &str, password: &str) -> Result<User, CredentialError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(CredentialError::InvalidCredentials);
        }

        let user = self.users.find_user_by_username(username).await?;
        let password = password.to_string();

        let Some(user) = user else {
            let dummy = self.dummy.clone();
            tokio::task::spawn_blocking(move || dummy.verify(&password))
                .await
                .map_err(|e| StoreError::backend(format!("password check task failed: {e}")))?;
            debug!("login attempt for unknown username");
            return Err(CredentialError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| StoreError::backend(format!("password check task failed: {e}")))?;

        if matches {
            Ok(user)
        } else {
            debug!(user_id = %user.id, "password mismatch");
            Err(CredentialError::InvalidCredentials)
        }
    }
}
