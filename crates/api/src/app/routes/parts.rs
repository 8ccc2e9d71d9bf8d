use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use stockroom_auth::Operation;
use stockroom_core::PartId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_parts).post(create_part))
        .route("/report", get(get_report))
        .route("/:id", get(get_part).put(update_part))
}

fn parse_part_id(raw: &str) -> Result<PartId, Response> {
    raw.parse::<PartId>()
        .map_err(errors::domain_error_to_response)
}

pub async fn list_parts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, Operation::ReadInventory) {
        return resp;
    }

    match services.catalog.list().await {
        Ok(parts) => Json(parts).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_part(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, Operation::ReadInventory) {
        return resp;
    }
    let id = match parse_part_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.get(id).await {
        Ok(part) => Json(part).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn create_part(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<dto::PartRequest>, JsonRejection>,
) -> Response {
    if let Err(resp) = authz::require(&principal, Operation::EditCatalog) {
        return resp;
    }
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services
        .catalog
        .create(body.into_new_part(), principal.user_id())
        .await
    {
        Ok(part) => Json(part).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update_part(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<dto::PartRequest>, JsonRejection>,
) -> Response {
    if let Err(resp) = authz::require(&principal, Operation::EditCatalog) {
        return resp;
    }
    let id = match parse_part_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services
        .catalog
        .update(id, body.attributes, body.quantity, principal.user_id())
        .await
    {
        Ok(part) => Json(part).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, Operation::ReadInventory) {
        return resp;
    }

    match services.catalog.report(Utc::now().date_naive()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}
