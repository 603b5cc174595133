use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Response;

use vitrine_auth::{AuthError, IdentityContext};

use crate::app::errors;

/// Identity attached by the access-control middleware.
///
/// Extracting it on a route the middleware exempted yields
/// `401 Authentication required`.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub IdentityContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or_else(|| errors::auth_rejection(&AuthError::AuthenticationRequired))
    }
}

/// Correlation id assigned to the request by the access-control middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub uuid::Uuid);

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
