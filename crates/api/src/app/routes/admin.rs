//! Back-office endpoints.
//!
//! The handlers are placeholders; what matters here is which guard chain
//! protects each route.

use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};

use vitrine_auth::{Guard, GuardChain, known};

use crate::app::{AppState, dto::MessageResponse};
use crate::authz::guarded;

pub fn router() -> Router<AppState> {
    Router::new()
        // Admin only
        .route("/dashboard", guarded(get(dashboard), GuardChain::admin()))
        .route("/system-stats", guarded(get(system_stats), GuardChain::admin()))
        // Manager and above
        .route("/reports", guarded(get(reports).post(create_report), GuardChain::manager()))
        // Permission based
        .route(
            "/users",
            guarded(get(list_users), GuardChain::user_management())
                .merge(guarded(post(create_user), permission(known::USER_CREATE))),
        )
        .route(
            "/users/:id",
            guarded(put(update_user), permission(known::USER_UPDATE))
                .merge(guarded(delete(delete_user), permission(known::USER_DELETE))),
        )
        .route(
            "/content",
            guarded(get(list_content), GuardChain::content_management())
                .merge(guarded(post(create_content), permission(known::CONTENT_CREATE))),
        )
        .route(
            "/content/:id",
            guarded(put(update_content), permission(known::CONTENT_UPDATE))
                .merge(guarded(delete(delete_content), permission(known::CONTENT_DELETE))),
        )
}

fn permission(name: vitrine_auth::PermissionName) -> GuardChain {
    GuardChain::new(vec![Guard::permissions([name])])
}

fn message(message: &'static str) -> Json<MessageResponse> {
    Json(MessageResponse { message })
}

pub async fn dashboard() -> Json<MessageResponse> {
    message("Admin dashboard data")
}

pub async fn system_stats() -> Json<MessageResponse> {
    message("System statistics")
}

pub async fn reports() -> Json<MessageResponse> {
    message("Reports data")
}

pub async fn create_report() -> Json<MessageResponse> {
    message("Report created")
}

pub async fn list_users() -> Json<MessageResponse> {
    message("All users data")
}

pub async fn create_user() -> Json<MessageResponse> {
    message("User created")
}

pub async fn update_user() -> Json<MessageResponse> {
    message("User updated")
}

pub async fn delete_user() -> Json<MessageResponse> {
    message("User deleted")
}

pub async fn list_content() -> Json<MessageResponse> {
    message("All content data")
}

pub async fn create_content() -> Json<MessageResponse> {
    message("Content created")
}

pub async fn update_content() -> Json<MessageResponse> {
    message("Content updated")
}

pub async fn delete_content() -> Json<MessageResponse> {
    message("Content deleted")
}
