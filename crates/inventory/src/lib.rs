//! Inventory domain module.
//!
//! This crate contains the business rules for the parts catalog and the
//! movement ledger, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod demo;
pub mod movement;
pub mod part;
pub mod report;

pub use movement::{
    ledger_balance, plan_movement, MovementEntry, MovementType, RecordMovement,
    OPENING_BALANCE_NOTE, OPENING_BALANCE_REFERENCE,
};
pub use part::{Condition, NewPart, Part, PartAttributes};
pub use demo::demo_parts;
pub use report::{InventoryReport, ReportLine, StockStatus, EXPIRY_WARNING_DAYS};
