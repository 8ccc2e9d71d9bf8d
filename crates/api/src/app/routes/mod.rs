use axum::{
    routing::{get, post},
    Router,
};

pub mod audit;
pub mod auth;
pub mod parts;
pub mod system;
pub mod transactions;

/// Routes that need no token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/login", post(auth::login))
}

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/auth/logout", post(auth::logout))
        .nest("/parts", parts::router())
        .nest("/transactions", transactions::router())
        .nest("/audit", audit::router())
}
