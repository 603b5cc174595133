use axum::{Router, routing::get};

use crate::app::AppState;

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod system;

/// Router for every endpoint; public/protected is decided by the access gate.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .nest("/api/auth", auth::router())
        .nest("/api/admin", admin::router())
        .nest("/api/accounts", accounts::router())
}
