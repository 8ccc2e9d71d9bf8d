use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use stockroom_audit::AuditEntry;
use stockroom_auth::User;
use stockroom_core::{AuditEntryId, DomainError, MovementId, PartId, UserId};
use stockroom_inventory::{
    plan_movement, MovementEntry, NewPart, Part, PartAttributes, RecordMovement,
};

use super::{AuditStore, InventoryStore, NewUser, StoreError, UserStore};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    parts: BTreeMap<PartId, Part>,
    ledger: Vec<MovementEntry>,
    audit: Vec<AuditEntry>,
    last_user_id: i64,
    last_part_id: i64,
    last_movement_id: i64,
    last_audit_id: i64,
}

impl State {
    fn user_name(&self, id: UserId) -> Option<String> {
        self.users.get(&id).map(|u| u.name.clone())
    }

    fn with_user(&self, entry: &AuditEntry) -> AuditEntry {
        let user = self.users.get(&entry.user_id);
        AuditEntry {
            user_name: user.map(|u| u.name.clone()),
            user_role: user.map(|u| u.role),
            ..entry.clone()
        }
    }

    fn ensure_user(&self, id: UserId) -> Result<(), StoreError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Conflict(format!("user {id} does not exist")))
        }
    }

    /// Check, append, adjust. The caller holds the write lock for the whole call.
    fn apply_movement(
        &mut self,
        cmd: &RecordMovement,
        actor: UserId,
        fail_after_append: bool,
    ) -> Result<(MovementEntry, Part), StoreError> {
        self.ensure_user(actor)?;
        let part = self.parts.get(&cmd.part_id).ok_or(DomainError::NotFound)?;
        let next_quantity = plan_movement(part, cmd)?;

        let entry = MovementEntry {
            id: MovementId::new(self.last_movement_id + 1),
            part_id: cmd.part_id,
            movement_type: cmd.movement_type,
            quantity: cmd.quantity,
            date: Utc::now(),
            reference: cmd.reference.clone(),
            note: cmd.note.clone(),
            user_id: actor,
            user_name: None,
        };
        self.ledger.push(entry.clone());

        if fail_after_append {
            self.ledger.pop();
            return Err(StoreError::backend("injected fault after ledger append"));
        }

        let user_name = self.user_name(actor);
        let Some(part) = self.parts.get_mut(&cmd.part_id) else {
            self.ledger.pop();
            return Err(DomainError::NotFound.into());
        };
        part.quantity = next_quantity;
        let part = part.clone();
        self.last_movement_id += 1;

        Ok((MovementEntry { user_name, ..entry }, part))
    }
}

/// In-memory store for tests and local development.
///
/// One write lock covers the whole store, so check-and-adjust on a part is
/// serialized. The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    fail_after_ledger_append: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next movement fail after its ledger line is staged but before
    /// the quantity is adjusted. One-shot.
    pub fn fail_next_movement_after_ledger_append(&self) {
        self.fail_after_ledger_append.store(true, Ordering::SeqCst);
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.read()?;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.users.len() as u64)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }

        state.last_user_id += 1;
        let stored = User {
            id: UserId::new(state.last_user_id),
            username: user.username,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
        };
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn list_parts(&self) -> Result<Vec<Part>, StoreError> {
        Ok(self.read()?.parts.values().cloned().collect())
    }

    async fn get_part(&self, id: PartId) -> Result<Option<Part>, StoreError> {
        Ok(self.read()?.parts.get(&id).cloned())
    }

    async fn create_part(&self, new_part: NewPart, actor: UserId) -> Result<Part, StoreError> {
        let mut state = self.write()?;
        state.ensure_user(actor)?;

        let id = PartId::new(state.last_part_id + 1);
        state.parts.insert(
            id,
            Part {
                id,
                attributes: new_part.attributes,
                quantity: 0,
            },
        );

        if new_part.opening_quantity > 0 {
            let fail = self.fail_after_ledger_append.swap(false, Ordering::SeqCst);
            let opening = RecordMovement::opening_balance(id, new_part.opening_quantity);
            match state.apply_movement(&opening, actor, fail) {
                Ok((_, part)) => {
                    state.last_part_id += 1;
                    return Ok(part);
                }
                Err(e) => {
                    state.parts.remove(&id);
                    return Err(e);
                }
            }
        }

        state.last_part_id += 1;
        state
            .parts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::backend("part vanished during create"))
    }

    async fn update_part(
        &self,
        id: PartId,
        attributes: PartAttributes,
        requested_quantity: Option<i64>,
    ) -> Result<Part, StoreError> {
        let mut state = self.write()?;
        let part = state.parts.get_mut(&id).ok_or(DomainError::NotFound)?;
        part.ensure_quantity_unchanged(requested_quantity)?;
        part.attributes = attributes;
        Ok(part.clone())
    }

    async fn apply_movement(
        &self,
        cmd: RecordMovement,
        actor: UserId,
    ) -> Result<(MovementEntry, Part), StoreError> {
        let fail = self.fail_after_ledger_append.swap(false, Ordering::SeqCst);
        self.write()?.apply_movement(&cmd, actor, fail)
    }

    async fn list_movements(&self, part_id: Option<PartId>) -> Result<Vec<MovementEntry>, StoreError> {
        let state = self.read()?;
        Ok(state
            .ledger
            .iter()
            .rev()
            .filter(|e| part_id.is_none_or(|id| e.part_id == id))
            .map(|e| MovementEntry {
                user_name: state.user_name(e.user_id),
                ..e.clone()
            })
            .collect())
    }
}

#[async_trait]
impl AuditStore for InMemoryStore {
    async fn append_audit(&self, action: String, actor: UserId) -> Result<AuditEntry, StoreError> {
        let mut state = self.write()?;
        state.ensure_user(actor)?;

        state.last_audit_id += 1;
        let entry = AuditEntry {
            id: AuditEntryId::new(state.last_audit_id),
            action,
            date: Utc::now(),
            user_id: actor,
            user_name: None,
            user_role: None,
        };
        state.audit.push(entry.clone());
        Ok(state.with_user(&entry))
    }

    async fn list_audit(&self) -> Result<Vec<AuditEntry>, StoreError> {
        let state = self.read()?;
        Ok(state.audit.iter().rev().map(|e| state.with_user(e)).collect())
    }
}
