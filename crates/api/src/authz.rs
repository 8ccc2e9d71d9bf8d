//! Route-level authorization helpers.

use axum::{http::StatusCode, response::Response};

use stockroom_auth::{authorize, Operation};
use stockroom_core::UserId;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

pub fn require(principal: &PrincipalContext, operation: Operation) -> Result<(), Response> {
    authorize(principal.identity(), operation).map_err(|e| {
        tracing::info!(user_id = %principal.user_id(), %operation, "request forbidden");
        json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
    })
}

/// The acting user is always the token's; a body `userId` may only repeat it.
pub fn ensure_acting_user(
    principal: &PrincipalContext,
    claimed: Option<UserId>,
) -> Result<UserId, Response> {
    match claimed {
        Some(id) if id != principal.user_id() => Err(json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "userId does not match the authenticated user",
        )),
        _ => Ok(principal.user_id()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use stockroom_auth::{Hs256SessionKeys, Identity, Role};

    use super::*;

    fn principal(role: Role) -> PrincipalContext {
        let keys = Hs256SessionKeys::new("test-secret");
        let identity = Identity {
            user_id: UserId::new(3),
            username: "viewer".to_string(),
            role,
        };
        let issued = keys.issue(&identity, Utc::now()).unwrap();
        PrincipalContext::from_claims(&issued.claims)
    }

    #[test]
    fn viewer_cannot_record_movements() {
        let viewer = principal(Role::Viewer);
        let denied = require(&viewer, Operation::RecordMovement).unwrap_err();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        assert!(require(&viewer, Operation::ReadInventory).is_ok());
    }

    #[test]
    fn acting_user_must_match_token() {
        let p = principal(Role::StockController);
        assert_eq!(ensure_acting_user(&p, None).unwrap(), UserId::new(3));
        assert_eq!(ensure_acting_user(&p, Some(UserId::new(3))).unwrap(), UserId::new(3));
        assert_eq!(
            ensure_acting_user(&p, Some(UserId::new(1))).unwrap_err().status(),
            StatusCode::FORBIDDEN
        );
    }
}
