use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, instrument};

use stockroom_audit::AuditAction;
use stockroom_core::{DomainError, PartId, UserId};
use stockroom_inventory::{InventoryReport, NewPart, Part, PartAttributes};

use crate::audit_recorder::AuditRecorder;
use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Rejected(DomainError),

    #[error(transparent)]
    Storage(StoreError),
}

impl From<DomainError> for CatalogError {
    fn from(e: DomainError) -> Self {
        Self::Rejected(e)
    }
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Domain(d) => Self::Rejected(d),
            other => Self::Storage(other),
        }
    }
}

/// Part catalog reads and attribute edits.
#[derive(Clone)]
pub struct PartCatalog {
    inventory: Arc<dyn InventoryStore>,
    audit: AuditRecorder,
}

impl PartCatalog {
    pub fn new(inventory: Arc<dyn InventoryStore>, audit: AuditRecorder) -> Self {
        Self { inventory, audit }
    }

    pub async fn list(&self) -> Result<Vec<Part>, CatalogError> {
        Ok(self.inventory.list_parts().await?)
    }

    pub async fn get(&self, id: PartId) -> Result<Part, CatalogError> {
        self.inventory
            .get_part(id)
            .await?
            .ok_or(CatalogError::Rejected(DomainError::NotFound))
    }

    #[instrument(skip(self, new_part), fields(part_number = %new_part.attributes.part_number), err(Display))]
    pub async fn create(&self, new_part: NewPart, actor: UserId) -> Result<Part, CatalogError> {
        let new_part = new_part.normalized()?;
        let part = self.inventory.create_part(new_part, actor).await?;
        info!(part_id = %part.id, quantity = part.quantity, "part created");

        self.audit
            .record(
                AuditAction::PartCreated {
                    part_number: part.attributes.part_number.clone(),
                },
                actor,
            )
            .await;
        Ok(part)
    }

    /// Replace attributes. Quantity only passes if it matches what is on hand.
    #[instrument(skip(self, attributes), err(Display))]
    pub async fn update(
        &self,
        id: PartId,
        attributes: PartAttributes,
        requested_quantity: Option<i64>,
        actor: UserId,
    ) -> Result<Part, CatalogError> {
        let attributes = attributes.normalized()?;
        let part = self
            .inventory
            .update_part(id, attributes, requested_quantity)
            .await?;
        info!(part_id = %part.id, "part updated");

        self.audit
            .record(
                AuditAction::PartUpdated {
                    part_number: part.attributes.part_number.clone(),
                },
                actor,
            )
            .await;
        Ok(part)
    }

    pub async fn report(&self, today: NaiveDate) -> Result<InventoryReport, CatalogError> {
        let parts = self.inventory.list_parts().await?;
        Ok(InventoryReport::build(&parts, today))
    }
}
