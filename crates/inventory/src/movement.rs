use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, FieldError, MovementId, PartId, UserId};

use crate::part::Part;

/// Ledger reference used for the IN movement booked when a part is created with stock.
pub const OPENING_BALANCE_REFERENCE: &str = "OPENING-BALANCE";
pub const OPENING_BALANCE_NOTE: &str = "Opening balance";

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
        }
    }

    /// Signed effect of `quantity` units on on-hand stock.
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "IN" => Ok(MovementType::In),
            "OUT" => Ok(MovementType::Out),
            _ => Err(DomainError::validation("type", "must be IN or OUT")),
        }
    }
}

/// Command: move stock in or out of a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMovement {
    pub part_id: PartId,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reference: String,
    pub note: String,
}

impl RecordMovement {
    /// Opening-balance receipt for a freshly created part.
    pub fn opening_balance(part_id: PartId, quantity: i64) -> Self {
        Self {
            part_id,
            movement_type: MovementType::In,
            quantity,
            reference: OPENING_BALANCE_REFERENCE.to_string(),
            note: OPENING_BALANCE_NOTE.to_string(),
        }
    }

    pub fn normalized(mut self) -> DomainResult<Self> {
        self.reference = self.reference.trim().to_string();
        self.note = self.note.trim().to_string();

        let mut errors = Vec::new();
        if self.quantity < 1 {
            errors.push(FieldError::new("quantity", "must be >= 1"));
        }
        if self.reference.chars().count() > 100 {
            errors.push(FieldError::new("reference", "must be at most 100 characters"));
        }
        DomainError::check_fields(errors)?;
        Ok(self)
    }

    pub fn signed_delta(&self) -> i64 {
        self.movement_type.signed(self.quantity)
    }
}

/// One immutable line of the movement ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementEntry {
    pub id: MovementId,
    pub part_id: PartId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    pub date: DateTime<Utc>,
    pub reference: String,
    pub note: String,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl MovementEntry {
    pub fn signed_delta(&self) -> i64 {
        self.movement_type.signed(self.quantity)
    }
}

/// Decide a movement against the part's current state.
///
/// Returns the quantity the part will hold once the movement commits. The caller
/// must hold the part lock while calling this and until the write commits.
pub fn plan_movement(part: &Part, cmd: &RecordMovement) -> DomainResult<i64> {
    if cmd.part_id != part.id {
        return Err(DomainError::not_found());
    }
    if cmd.quantity < 1 {
        return Err(DomainError::validation("quantity", "must be >= 1"));
    }

    match cmd.movement_type {
        MovementType::Out if cmd.quantity > part.quantity => Err(
            DomainError::insufficient_stock(cmd.quantity, part.quantity),
        ),
        MovementType::Out => Ok(part.quantity - cmd.quantity),
        MovementType::In => part
            .quantity
            .checked_add(cmd.quantity)
            .filter(|q| *q <= i64::from(i32::MAX))
            .ok_or_else(|| DomainError::validation("quantity", "would overflow on-hand stock")),
    }
}

/// Σ IN − Σ OUT over the ledger lines of one part.
pub fn ledger_balance<'a, I>(entries: I, part_id: PartId) -> i64
where
    I: IntoIterator<Item = &'a MovementEntry>,
{
    entries
        .into_iter()
        .filter(|e| e.part_id == part_id)
        .map(MovementEntry::signed_delta)
        .sum()
}
