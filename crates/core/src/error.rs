//! Domain error model.

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// A single failed field check, surfaced to callers as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl core::fmt::Display for FieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// stock rules, missing references). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more fields failed validation.
    #[error("validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// An OUT movement asked for more than is on hand.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn insufficient_stock(requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Collect field errors into a result: `Ok(())` when none were recorded.
    pub fn check_fields(errors: Vec<FieldError>) -> DomainResult<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self::Validation(errors))
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let err = DomainError::Validation(vec![
            FieldError::new("partNumber", "must not be empty"),
            FieldError::new("unitCost", "must be >= 0"),
        ]);

        let msg = err.to_string();
        assert!(msg.contains("partNumber: must not be empty"));
        assert!(msg.contains("unitCost: must be >= 0"));
    }

    #[test]
    fn check_fields_is_ok_when_empty() {
        assert!(DomainError::check_fields(vec![]).is_ok());
        assert!(matches!(
            DomainError::check_fields(vec![FieldError::new("x", "bad")]),
            Err(DomainError::Validation(v)) if v.len() == 1
        ));
    }
}
