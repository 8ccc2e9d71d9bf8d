use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use stockroom_audit::AuditAction;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Response {
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let user = match services.credentials.verify(&body.username, &body.password).await {
        Ok(u) => u,
        Err(e) => return errors::credential_error_to_response(e),
    };

    let issued = match services.session_keys.issue(&user.identity(), Utc::now()) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "failed to sign session token");
            return errors::json_error(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "Server error",
            );
        }
    };

    services.audit.record(AuditAction::LoggedIn, user.id).await;
    tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");

    Json(dto::LoginResponse {
        token: issued.token,
        user: user.profile(),
    })
    .into_response()
}

/// Revoke the presented token until it would have expired anyway.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    services
        .denylist
        .revoke(principal.token_id(), principal.expires_at(), Utc::now());
    services
        .audit
        .record(AuditAction::LoggedOut, principal.user_id())
        .await;
    tracing::info!(user_id = %principal.user_id(), "logged out");

    Json(dto::SuccessResponse::ok()).into_response()
}
