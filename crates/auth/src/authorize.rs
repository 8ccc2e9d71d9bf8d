use thiserror::Error;

use crate::{Identity, Operation, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Authenticated, but the role does not grant the operation.
    #[error("forbidden: role '{role}' may not perform '{operation}'")]
    Forbidden { role: Role, operation: Operation },
}

/// Authorize an identity for a single operation.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(identity: &Identity, operation: Operation) -> Result<(), AuthzError> {
    if operation.allowed_roles().contains(&identity.role) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: identity.role,
            operation,
        })
    }
}

/// Every operation the role grants, in policy-table order.
pub fn granted_operations(role: Role) -> Vec<Operation> {
    Operation::ALL
        .into_iter()
        .filter(|op| op.allowed_roles().contains(&role))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::UserId;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: UserId::new(7),
            username: "someone".to_string(),
            role,
        }
    }

    #[test]
    fn policy_table_is_reproduced_exactly() {
        use Operation::*;
        use Role::*;

        let expected: &[(Operation, Role, bool)] = &[
            (ReadInventory, Admin, true),
            (ReadInventory, StockController, true),
            (ReadInventory, Viewer, true),
            (EditCatalog, Admin, true),
            (EditCatalog, StockController, true),
            (EditCatalog, Viewer, false),
            (RecordMovement, Admin, true),
            (RecordMovement, StockController, true),
            (RecordMovement, Viewer, false),
            (ReadAudit, Admin, true),
            (ReadAudit, StockController, false),
            (ReadAudit, Viewer, false),
            (WriteAudit, Admin, true),
            (WriteAudit, StockController, true),
            (WriteAudit, Viewer, true),
        ];

        for (op, role, allowed) in expected {
            let result = authorize(&identity(*role), *op);
            assert_eq!(result.is_ok(), *allowed, "{role} / {op}");
        }
    }

    #[test]
    fn denial_names_role_and_operation() {
        let err = authorize(&identity(Role::Viewer), Operation::RecordMovement).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden {
                role: Role::Viewer,
                operation: Operation::RecordMovement
            }
        );
        assert!(err.to_string().contains("movements.record"));
    }

    #[test]
    fn granted_operations_for_viewer() {
        assert_eq!(
            granted_operations(Role::Viewer),
            vec![Operation::ReadInventory, Operation::WriteAudit]
        );
        assert_eq!(granted_operations(Role::Admin).len(), Operation::ALL.len());
    }
}
