use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Server-side revocation list keyed by token id.
///
/// Entries only need to live until the token would have expired anyway, so
/// they are dropped lazily on every insert.
#[derive(Debug, Default)]
pub struct TokenDenylist {
    inner: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl TokenDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, jti: Uuid, expires_at: DateTime<Utc>, now: DateTime<Utc>) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|_, exp| *exp > now);
            map.insert(jti, expires_at);
        }
    }

    pub fn is_revoked(&self, jti: &Uuid) -> bool {
        match self.inner.read() {
            Ok(map) => map.contains_key(jti),
            // A poisoned list must not let revoked tokens back in.
            Err(_) => true,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
