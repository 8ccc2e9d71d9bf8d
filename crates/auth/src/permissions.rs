use serde::Serialize;

use crate::Role;

/// Operations gated by the role policy.
///
/// Each operation maps to a fixed set of roles; see [`Operation::allowed_roles`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read parts and the movement ledger.
    ReadInventory,
    /// Create or update catalog attributes.
    EditCatalog,
    /// Record an IN/OUT movement.
    RecordMovement,
    /// Read the audit trail.
    ReadAudit,
    /// Append a free-form audit entry.
    WriteAudit,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::ReadInventory,
        Operation::EditCatalog,
        Operation::RecordMovement,
        Operation::ReadAudit,
        Operation::WriteAudit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ReadInventory => "inventory.read",
            Operation::EditCatalog => "catalog.edit",
            Operation::RecordMovement => "movements.record",
            Operation::ReadAudit => "audit.read",
            Operation::WriteAudit => "audit.write",
        }
    }

    /// The policy table.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Operation::ReadInventory => &[Role::Admin, Role::StockController, Role::Viewer],
            Operation::EditCatalog => &[Role::Admin, Role::StockController],
            Operation::RecordMovement => &[Role::Admin, Role::StockController],
            Operation::ReadAudit => &[Role::Admin],
            Operation::WriteAudit => &Role::ALL,
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
