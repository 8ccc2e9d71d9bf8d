use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use stockroom_auth::Operation;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_movements).post(record_movement))
}

/// Ledger lines newest first, optionally for one part.
pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<dto::TransactionsQuery>, QueryRejection>,
) -> Response {
    if let Err(resp) = authz::require(&principal, Operation::ReadInventory) {
        return resp;
    }
    let params = match dto::query(params) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.coordinator.list_movements(params.part_id).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => errors::movement_error_to_response(e),
    }
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<dto::MovementRequest>, JsonRejection>,
) -> Response {
    if let Err(resp) = authz::require(&principal, Operation::RecordMovement) {
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

    match services.coordinator.record_movement(body.command(), actor).await {
        Ok(entry) => Json(entry).into_response(),
        Err(e) => errors::movement_error_to_response(e),
    }
}
