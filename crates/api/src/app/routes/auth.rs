//! Login and current-identity endpoints.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use vitrine_auth::{AuthError, PasswordError, verify_dummy_password, verify_password};

use crate::app::{
    AppState,
    dto::{AccountSummary, IdentityResponse, LoginRequest, LoginResponse},
    errors,
};
use crate::context::CurrentIdentity;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const LOGIN_FAILED: &str = "Login failed";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
}

/// POST /api/auth/login
pub async fn login(State(state): State<AppState>, body: Result<Json<LoginRequest>, JsonRejection>) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if let Err(message) = body.validate() {
        return errors::json_error(StatusCode::BAD_REQUEST, message);
    }

    let record = match state.store.find_login(body.email.trim()).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            // Same Argon2 cost as a wrong password, so timing does not reveal
            // which emails have accounts.
            let password = body.password;
            let _ = tokio::task::spawn_blocking(move || verify_dummy_password(&password)).await;
            return errors::json_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
        }
        Err(e) => {
            tracing::error!(error = %e, "login lookup failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, LOGIN_FAILED);
        }
    };

    // Argon2 is deliberately slow; keep it off the async workers.
    let password = body.password;
    let hash = record.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await;

    match verified {
        Ok(Ok(())) => {}
        Ok(Err(PasswordError::Mismatch)) => {
            tracing::info!(account_id = %record.id, "login rejected: wrong password");
            return errors::json_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
        }
        Ok(Err(e)) => {
            tracing::error!(account_id = %record.id, error = %e, "stored password hash unusable");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, LOGIN_FAILED);
        }
        Err(e) => {
            tracing::error!(error = %e, "password verification task failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, LOGIN_FAILED);
        }
    }

    if !record.status.is_active() {
        return errors::auth_rejection(&AuthError::AccountNotActive);
    }

    let token = match state.tokens.issue(record.id, Utc::now(), state.token_ttl) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(account_id = %record.id, error = %e, "token issue failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, LOGIN_FAILED);
        }
    };

    tracing::info!(account_id = %record.id, "login succeeded");
    let user = AccountSummary {
        id: record.id,
        email: record.email,
        status: record.status,
    };
    Json(LoginResponse::new(user, token)).into_response()
}

/// GET /api/auth/me
pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<IdentityResponse> {
    Json(IdentityResponse::from(&identity))
}
