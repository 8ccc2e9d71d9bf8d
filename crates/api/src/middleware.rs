use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use stockroom_auth::{JwtValidator, TokenDenylist, TokenError};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub denylist: Arc<TokenDenylist>,
}

/// Decode the bearer token into a [`PrincipalContext`] extension.
///
/// A missing token is `401`; a token that is present but unusable is `403`.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers()).map_err(token_error_response)?;

    let claims = state
        .jwt
        .validate(token, Utc::now())
        .map_err(token_error_response)?;

    if state.denylist.is_revoked(&claims.jti) {
        return Err(token_error_response(TokenError::Revoked));
    }

    req.extensions_mut()
        .insert(PrincipalContext::from_claims(&claims));

    Ok(next.run(req).await)
}

fn token_error_response(err: TokenError) -> Response {
    let (status, code) = match err {
        TokenError::Missing => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        TokenError::Invalid | TokenError::Signing(_) => (StatusCode::FORBIDDEN, "token_invalid"),
        TokenError::Expired => (StatusCode::FORBIDDEN, "token_expired"),
        TokenError::Revoked => (StatusCode::FORBIDDEN, "token_revoked"),
    };
    json_error(status, code, err.to_string())
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, TokenError> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(TokenError::Missing);
    };

    let header = header.to_str().map_err(|_| TokenError::Invalid)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(TokenError::Invalid)?
        .trim();
    if token.is_empty() {
        return Err(TokenError::Missing);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Err(TokenError::Missing));
        assert_eq!(extract_bearer(&headers("Bearer ")), Err(TokenError::Missing));
        assert_eq!(extract_bearer(&headers("Basic abc")), Err(TokenError::Invalid));
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Ok("abc.def"));
    }

    #[test]
    fn missing_is_401_everything_else_403() {
        assert_eq!(
            token_error_response(TokenError::Missing).status(),
            StatusCode::UNAUTHORIZED
        );
        for err in [TokenError::Invalid, TokenError::Expired, TokenError::Revoked] {
            assert_eq!(token_error_response(err).status(), StatusCode::FORBIDDEN);
        }
    }
}
