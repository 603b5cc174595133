//! HTTP API application wiring (Axum router + shared state).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Router, http::StatusCode};
use chrono::Duration;

use vitrine_auth::{AccessDecisionEngine, Hs256TokenCodec, IdentityResolver, IdentityStore, RouteClassifier};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AccessDecisionEngine>,
    pub tokens: Arc<Hs256TokenCodec>,
    pub store: Arc<dyn IdentityStore>,
    pub token_ttl: Duration,
}

impl AppState {
    /// Wire the access-control core around an identity store.
    ///
    /// The same codec signs tokens at login and verifies them in the gate.
    pub fn new(store: Arc<dyn IdentityStore>, jwt_secret: &str, token_ttl: Duration) -> Self {
        Self::with_classifier(store, jwt_secret, token_ttl, RouteClassifier::site_defaults())
    }

    pub fn with_classifier(
        store: Arc<dyn IdentityStore>,
        jwt_secret: &str,
        token_ttl: Duration,
        classifier: RouteClassifier,
    ) -> Self {
        let tokens = Arc::new(Hs256TokenCodec::new(jwt_secret));
        let engine = AccessDecisionEngine::new(
            Arc::new(classifier),
            tokens.clone(),
            IdentityResolver::new(store.clone()),
        );

        Self {
            engine: Arc::new(engine),
            tokens,
            store,
            token_ttl,
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// The access gate wraps the whole router, fallback included, so unknown
/// protected paths are rejected before they can 404.
pub fn build_app(state: AppState) -> Router {
    let access = middleware::AccessState {
        engine: state.engine.clone(),
    };

    routes::router()
        .fallback(|| async { errors::json_error(StatusCode::NOT_FOUND, "Route not found") })
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(access, middleware::access_control))
}
