//! Storage ports and their adapters.
//!
//! Every write that touches a part's quantity goes through
//! [`InventoryStore::apply_movement`] or [`InventoryStore::create_part`]; both
//! lock the part, append to the ledger and adjust the quantity as one unit.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_audit::AuditEntry;
use stockroom_auth::{Role, User};
use stockroom_core::{DomainError, PartId, UserId};
use stockroom_inventory::{MovementEntry, NewPart, Part, PartAttributes, RecordMovement};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Business rule rejected the write; state is unchanged.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Unique or foreign-key constraint rejected the write.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Anything else: connection loss, poisoned lock, unreadable row.
    #[error("storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// User to provision; the password is already hashed.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn count_users(&self) -> Result<u64, StoreError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// All parts, ordered by id.
    async fn list_parts(&self) -> Result<Vec<Part>, StoreError>;

    async fn get_part(&self, id: PartId) -> Result<Option<Part>, StoreError>;

    /// Insert a part at quantity zero and, for a positive opening quantity,
    /// ledger it as an opening-balance IN movement in the same unit.
    async fn create_part(&self, new_part: NewPart, actor: UserId) -> Result<Part, StoreError>;

    /// Replace a part's attributes. `requested_quantity` is the quantity the
    /// client believes the part holds, checked under the part lock.
    async fn update_part(
        &self,
        id: PartId,
        attributes: PartAttributes,
        requested_quantity: Option<i64>,
    ) -> Result<Part, StoreError>;

    /// Lock the part, check sufficiency, append the ledger entry and adjust the
    /// quantity. Returns the committed entry together with the part as it now
    /// stands.
    async fn apply_movement(
        &self,
        cmd: RecordMovement,
        actor: UserId,
    ) -> Result<(MovementEntry, Part), StoreError>;

    /// Ledger entries, newest first, optionally for one part.
    async fn list_movements(&self, part_id: Option<PartId>) -> Result<Vec<MovementEntry>, StoreError>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_audit(&self, action: String, actor: UserId) -> Result<AuditEntry, StoreError>;

    /// Audit trail, newest first.
    async fn list_audit(&self) -> Result<Vec<AuditEntry>, StoreError>;
}
