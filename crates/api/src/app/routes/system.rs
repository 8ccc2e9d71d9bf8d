use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use stockroom_auth::granted_operations;

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    let identity = principal.identity();
    Json(serde_json::json!({
        "userId": identity.user_id,
        "username": identity.username,
        "role": identity.role,
        "operations": granted_operations(identity.role)
            .iter()
            .map(|op| op.as_str())
            .collect::<Vec<_>>(),
        "expiresAt": principal.expires_at(),
    }))
}
