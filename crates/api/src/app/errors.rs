use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use stockroom_core::{DomainError, FieldError};
use stockroom_infra::{CatalogError, CredentialError, MovementError, StoreError};

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn validation_errors(errors: &[FieldError]) -> Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": "validation failed",
            "errors": errors,
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(errors) => validation_errors(&errors),
        DomainError::InsufficientStock {
            requested,
            available,
        } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!("Insufficient stock. Available: {available}"),
                "requested": requested,
                "available": available,
            })),
        )
            .into_response(),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

/// Storage detail is logged here and never sent to the client.
pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Conflict(msg) => {
            tracing::warn!(error = %msg, "write rejected by constraint");
            json_error(StatusCode::CONFLICT, "conflict", "conflicting write")
        }
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "server_error", "Server error")
        }
    }
}

pub fn movement_error_to_response(err: MovementError) -> Response {
    match err {
        MovementError::Rejected(e) => domain_error_to_response(e),
        MovementError::Storage(e) => store_error_to_response(e),
    }
}

pub fn catalog_error_to_response(err: CatalogError) -> Response {
    match err {
        CatalogError::Rejected(e) => domain_error_to_response(e),
        CatalogError::Storage(e) => store_error_to_response(e),
    }
}

pub fn credential_error_to_response(err: CredentialError) -> Response {
    match err {
        CredentialError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "Invalid credentials",
        ),
        CredentialError::Store(e) => store_error_to_response(e),
    }
}
