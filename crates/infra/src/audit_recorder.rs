use std::sync::Arc;

use tracing::error;

use stockroom_audit::{AuditAction, AuditEntry};
use stockroom_core::UserId;

use crate::store::{AuditStore, StoreError};

/// Appends audit lines after the primary operation has committed.
///
/// Recording is best effort: a failed write is logged at `error` and never
/// undoes the change it describes.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, action: AuditAction, actor: UserId) -> Option<AuditEntry> {
        let text = action.text();
        match self.store.append_audit(text.clone(), actor).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                error!(error = %e, user_id = %actor, action = %text, "failed to record audit entry");
                None
            }
        }
    }

    /// Client-posted line. Unlike [`record`](Self::record), failures are
    /// returned: the write is the whole request.
    pub async fn record_strict(&self, action: AuditAction, actor: UserId) -> Result<AuditEntry, StoreError> {
        self.store.append_audit(action.text(), actor).await
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<AuditEntry>, StoreError> {
        self.store.list_audit().await
    }
}
