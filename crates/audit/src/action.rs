use stockroom_core::{DomainError, DomainResult};
use stockroom_inventory::MovementType;

/// Width of the `audit_logs.action` column.
pub const MAX_ACTION_LEN: usize = 255;

/// A state change worth an audit line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditAction {
    LoggedIn,
    LoggedOut,
    PartCreated {
        part_number: String,
    },
    PartUpdated {
        part_number: String,
    },
    StockMoved {
        movement_type: MovementType,
        quantity: i64,
        part_number: String,
        reference: String,
    },
    /// Free text posted by a client.
    Custom(String),
}

impl AuditAction {
    /// Client-supplied action line, trimmed and bounded to the column width.
    pub fn custom(text: &str) -> DomainResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::validation("action", "must not be empty"));
        }
        if text.chars().count() > MAX_ACTION_LEN {
            return Err(DomainError::validation(
                "action",
                format!("must be at most {MAX_ACTION_LEN} characters"),
            ));
        }
        Ok(AuditAction::Custom(text.to_string()))
    }

    /// Rendered action line, truncated to fit the column.
    pub fn text(&self) -> String {
        let rendered = self.to_string();
        match rendered.char_indices().nth(MAX_ACTION_LEN) {
            Some((cut, _)) => rendered[..cut].to_string(),
            None => rendered,
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AuditAction::LoggedIn => f.write_str("Logged in"),
            AuditAction::LoggedOut => f.write_str("Logged out"),
            AuditAction::PartCreated { part_number } => write!(f, "Added new part {part_number}"),
            AuditAction::PartUpdated { part_number } => write!(f, "Updated part {part_number}"),
            AuditAction::StockMoved {
                movement_type,
                quantity,
                part_number,
                reference,
            } => {
                let verb = match movement_type {
                    MovementType::In => "Received",
                    MovementType::Out => "Issued",
                };
                write!(f, "{verb} {quantity}× {part_number} — Ref: {reference}")
            }
            AuditAction::Custom(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates() {
        assert_eq!(AuditAction::LoggedIn.text(), "Logged in");
        assert_eq!(AuditAction::LoggedOut.text(), "Logged out");
        assert_eq!(
            AuditAction::PartCreated {
                part_number: "PN-1".into()
            }
            .text(),
            "Added new part PN-1"
        );
        assert_eq!(
            AuditAction::PartUpdated {
                part_number: "PN-1".into()
            }
            .text(),
            "Updated part PN-1"
        );
        assert_eq!(
            AuditAction::StockMoved {
                movement_type: MovementType::In,
                quantity: 5,
                part_number: "PN-3305-C".into(),
                reference: "PO-2025-003".into(),
            }
            .text(),
            "Received 5× PN-3305-C — Ref: PO-2025-003"
        );
        assert_eq!(
            AuditAction::StockMoved {
                movement_type: MovementType::Out,
                quantity: 2,
                part_number: "PN-3305-C".into(),
                reference: "WO-A320-044".into(),
            }
            .text(),
            "Issued 2× PN-3305-C — Ref: WO-A320-044"
        );
    }

    #[test]
    fn custom_actions_are_bounded() {
        assert!(AuditAction::custom("   ").is_err());
        assert!(AuditAction::custom(&"x".repeat(MAX_ACTION_LEN + 1)).is_err());
        assert_eq!(
            AuditAction::custom("  Exported report ").unwrap(),
            AuditAction::Custom("Exported report".into())
        );
    }

    #[test]
    fn long_rendered_lines_are_truncated() {
        let action = AuditAction::PartUpdated {
            part_number: "é".repeat(400),
        };
        assert_eq!(action.text().chars().count(), MAX_ACTION_LEN);
    }
}
