use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use vitrine_auth::{AuthError, RejectionClass};

/// `{"error": message}` with the given status.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}

pub fn status_for(class: RejectionClass) -> StatusCode {
    match class {
        RejectionClass::Unauthenticated => StatusCode::UNAUTHORIZED,
        RejectionClass::Forbidden => StatusCode::FORBIDDEN,
        RejectionClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render an access-control rejection. Internal fault details never reach
/// the client.
pub fn auth_rejection(err: &AuthError) -> Response {
    json_error(status_for(err.class()), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_auth::RoleName;

    #[test]
    fn rejection_statuses() {
        assert_eq!(auth_rejection(&AuthError::MissingToken).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(auth_rejection(&AuthError::Expired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(auth_rejection(&AuthError::UnknownSubject).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(auth_rejection(&AuthError::AccountNotActive).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            auth_rejection(&AuthError::InsufficientRole {
                required: vec![RoleName::ADMIN]
            })
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            auth_rejection(&AuthError::internal("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
