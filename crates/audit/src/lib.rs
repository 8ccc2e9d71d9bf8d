//! Audit trail domain model.
//!
//! Entries are append-only and carry a fixed, human-readable action line. Storage
//! and recording live in `stockroom-infra`.

pub mod action;
pub mod entry;

pub use action::{AuditAction, MAX_ACTION_LEN};
pub use entry::AuditEntry;
