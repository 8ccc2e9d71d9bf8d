use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use stockroom_audit::AuditAction;
use stockroom_auth::Operation;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_audit).post(append_audit))
}

pub async fn list_audit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, Operation::ReadAudit) {
        return resp;
    }

    match services.audit.list().await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn append_audit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<dto::AuditRequest>, JsonRejection>,
) -> Response {
    if let Err(resp) = authz::require(&principal, Operation::WriteAudit) {
        return resp;
    }
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let actor = match authz::ensure_acting_user(&principal, body.user_id) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let action = match AuditAction::custom(&body.action) {
        Ok(a) => a,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.audit.record_strict(action, actor).await {
        Ok(_) => Json(dto::SuccessResponse::ok()).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
