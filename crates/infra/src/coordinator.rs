//! Stock mutation coordinator: the only path that changes on-hand quantity
//! after a part exists.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use stockroom_audit::AuditAction;
use stockroom_core::{DomainError, PartId, UserId};
use stockroom_inventory::{MovementEntry, RecordMovement};

use crate::audit_recorder::AuditRecorder;
use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Error)]
pub enum MovementError {
    /// Validation, unknown part or insufficient stock. Never retried.
    #[error(transparent)]
    Rejected(DomainError),

    /// Storage failed; the unit was rolled back and may be retried.
    #[error(transparent)]
    Storage(StoreError),
}

impl From<DomainError> for MovementError {
    fn from(e: DomainError) -> Self {
        Self::Rejected(e)
    }
}

impl From<StoreError> for MovementError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Domain(d) => Self::Rejected(d),
            other => Self::Storage(other),
        }
    }
}

#[derive(Clone)]
pub struct StockMutationCoordinator {
    inventory: Arc<dyn InventoryStore>,
    audit: AuditRecorder,
}

impl StockMutationCoordinator {
    pub fn new(inventory: Arc<dyn InventoryStore>, audit: AuditRecorder) -> Self {
        Self { inventory, audit }
    }

    /// Validate, then lock-check-append-adjust as one unit, then audit.
    #[instrument(
        skip(self, cmd),
        fields(part_id = %cmd.part_id, movement_type = %cmd.movement_type, quantity = cmd.quantity),
        err(Display)
    )]
    pub async fn record_movement(
        &self,
        cmd: RecordMovement,
        actor: UserId,
    ) -> Result<MovementEntry, MovementError> {
        let cmd = cmd.normalized()?;

        let (entry, part) = match self.inventory.apply_movement(cmd, actor).await {
            Ok(committed) => committed,
            Err(StoreError::Domain(DomainError::InsufficientStock { requested, available })) => {
                warn!(requested, available, "movement rejected: insufficient stock");
                return Err(DomainError::insufficient_stock(requested, available).into());
            }
            Err(e) => return Err(e.into()),
        };
        info!(movement_id = %entry.id, new_quantity = part.quantity, "movement committed");

        self.audit
            .record(
                AuditAction::StockMoved {
                    movement_type: entry.movement_type,
                    quantity: entry.quantity,
                    part_number: part.attributes.part_number.clone(),
                    reference: entry.reference.clone(),
                },
                actor,
            )
            .await;

        Ok(entry)
    }

    /// Ledger lines, newest first. Read-only.
    pub async fn list_movements(
        &self,
        part_id: Option<PartId>,
    ) -> Result<Vec<MovementEntry>, MovementError> {
        Ok(self.inventory.list_movements(part_id).await?)
    }
}
