use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use stockroom_audit::AuditEntry;
use stockroom_core::PartId;
use stockroom_inventory::{InventoryReport, MovementEntry, Part, PartAttributes, RecordMovement};

use crate::Session;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    /// Bad credentials on login.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, invalid, expired or revoked token. The session is unusable;
    /// discard it and log in again.
    #[error("session ended ({code})")]
    SessionEnded { code: String },

    /// Authenticated, but the role may not do this.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: serde_json::Value },

    #[error("parse error: {0}")]
    Parse(String),
}

impl ClientError {
    /// Whether the caller must drop its [`Session`].
    pub fn ends_session(&self) -> bool {
        matches!(self, ClientError::SessionEnded { .. })
    }
}

#[derive(Clone)]
pub struct ApiClient {
    api_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        matches!(
            self.http.get(self.url("/health")).send().await,
            Ok(resp) if resp.status().is_success()
        )
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let req = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }));

        match send(req).await {
            Err(ClientError::Api { status, .. }) if status == StatusCode::UNAUTHORIZED.as_u16() => {
                Err(ClientError::InvalidCredentials)
            }
            other => other,
        }
    }

    /// Revoke the session's token server-side. The session is consumed either way.
    pub async fn logout(&self, session: Session) -> Result<(), ClientError> {
        let req = self.authed(self.http.post(self.url("/auth/logout")), &session);
        send::<serde_json::Value>(req).await.map(|_| ())
    }

    pub async fn list_parts(&self, session: &Session) -> Result<Vec<Part>, ClientError> {
        send(self.authed(self.http.get(self.url("/parts")), session)).await
    }

    pub async fn get_part(&self, session: &Session, id: PartId) -> Result<Part, ClientError> {
        send(self.authed(self.http.get(self.url(&format!("/parts/{id}"))), session)).await
    }

    /// Add a part. `opening_quantity` is booked server-side as an IN movement.
    pub async fn create_part(
        &self,
        session: &Session,
        attributes: &PartAttributes,
        opening_quantity: i64,
    ) -> Result<Part, ClientError> {
        let req = self.http.post(self.url("/parts")).json(&CreatePartBody {
            attributes,
            quantity: opening_quantity,
        });
        send(self.authed(req, session)).await
    }

    pub async fn update_part(
        &self,
        session: &Session,
        id: PartId,
        attributes: &PartAttributes,
    ) -> Result<Part, ClientError> {
        let req = self
            .http
            .put(self.url(&format!("/parts/{id}")))
            .json(attributes);
        send(self.authed(req, session)).await
    }

    pub async fn report(&self, session: &Session) -> Result<InventoryReport, ClientError> {
        send(self.authed(self.http.get(self.url("/parts/report")), session)).await
    }

    pub async fn record_movement(
        &self,
        session: &Session,
        cmd: &RecordMovement,
    ) -> Result<MovementEntry, ClientError> {
        let req = self.http.post(self.url("/transactions")).json(&json!({
            "partId": cmd.part_id,
            "type": cmd.movement_type,
            "quantity": cmd.quantity,
            "reference": cmd.reference,
            "note": cmd.note,
        }));
        send(self.authed(req, session)).await
    }

    pub async fn list_movements(
        &self,
        session: &Session,
        part_id: Option<PartId>,
    ) -> Result<Vec<MovementEntry>, ClientError> {
        let mut req = self.http.get(self.url("/transactions"));
        if let Some(id) = part_id {
            req = req.query(&[("partId", id.get())]);
        }
        send(self.authed(req, session)).await
    }

    pub async fn list_audit(&self, session: &Session) -> Result<Vec<AuditEntry>, ClientError> {
        send(self.authed(self.http.get(self.url("/audit")), session)).await
    }

    pub async fn append_audit(&self, session: &Session, action: &str) -> Result<(), ClientError> {
        let req = self
            .http
            .post(self.url("/audit"))
            .json(&json!({ "action": action }));
        send::<serde_json::Value>(self.authed(req, session)).await.map(|_| ())
    }

    fn authed(&self, req: RequestBuilder, session: &Session) -> RequestBuilder {
        req.bearer_auth(session.token())
    }
}

#[derive(Serialize)]
struct CreatePartBody<'a> {
    #[serde(flatten)]
    attributes: &'a PartAttributes,
    quantity: i64,
}

async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
    let resp = req
        .send()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    let status = resp.status();

    if status.is_success() {
        return resp
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()));
    }

    let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
    let code = body["error"].as_str().unwrap_or_default().to_string();
    tracing::debug!(status = status.as_u16(), %code, "request failed");

    Err(match (status, code.as_str()) {
        (StatusCode::UNAUTHORIZED, "unauthenticated")
        | (StatusCode::FORBIDDEN, "token_invalid" | "token_expired" | "token_revoked") => {
            ClientError::SessionEnded { code }
        }
        (StatusCode::FORBIDDEN, _) => ClientError::Forbidden(
            body["message"].as_str().unwrap_or("forbidden").to_string(),
        ),
        _ => ClientError::Api {
            status: status.as_u16(),
            body,
        },
    })
}
