use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::response::Response;
use serde::{Deserialize, Serialize};

use stockroom_auth::UserProfile;
use stockroom_core::{FieldError, PartId, UserId};
use stockroom_inventory::{MovementType, NewPart, PartAttributes, RecordMovement};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Create/update body: the part attributes plus an optional quantity.
#[derive(Debug, Deserialize)]
pub struct PartRequest {
    #[serde(flatten)]
    pub attributes: PartAttributes,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl PartRequest {
    pub fn into_new_part(self) -> NewPart {
        NewPart {
            attributes: self.attributes,
            opening_quantity: self.quantity.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRequest {
    pub part_id: PartId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl MovementRequest {
    pub fn command(&self) -> RecordMovement {
        RecordMovement {
            part_id: self.part_id,
            movement_type: self.movement_type,
            quantity: self.quantity,
            reference: self.reference.clone().unwrap_or_default(),
            note: self.note.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    pub action: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    pub part_id: Option<PartId>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// -------------------------
// Extractor helpers
// -------------------------

/// Unwrap a JSON body, answering malformed input with the usual 400 shape.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(v)| v).map_err(|e| {
        errors::validation_errors(&[FieldError::new("body", e.body_text())])
    })
}

pub fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, Response> {
    params.map(|Query(v)| v).map_err(|e| {
        errors::validation_errors(&[FieldError::new("query", e.body_text())])
    })
}
