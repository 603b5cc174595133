//! Account self-service endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use vitrine_auth::{Guard, GuardChain, IdentityContext};
use vitrine_core::AccountId;

use crate::app::{AppState, dto::IdentityResponse, errors};
use crate::authz::guarded;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/:userId/permissions",
        guarded(get(permissions), GuardChain::user().then(Guard::ownership("userId"))),
    )
}

/// GET /api/accounts/:userId/permissions
///
/// Role and effective permissions of an account. Callers may only inspect
/// themselves; admins may inspect anyone.
pub async fn permissions(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let Ok(id) = user_id.parse::<AccountId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "\"userId\" must be a number");
    };

    match state.store.find_account_profile(id).await {
        Ok(Some(profile)) => Json(IdentityResponse::from(&IdentityContext::from_profile(profile))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "Account not found"),
        Err(e) => {
            tracing::error!(account_id = %id, error = %e, "permission lookup failed");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch permissions")
        }
    }
}
