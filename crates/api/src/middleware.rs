use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::Instrument;

use vitrine_auth::{AccessDecision, AccessDecisionEngine};

use crate::app::errors;
use crate::context::RequestId;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct AccessState {
    pub engine: Arc<AccessDecisionEngine>,
}

/// Global access gate: runs once for every request, before routing.
///
/// Exempt requests pass with no identity attached; authenticated requests
/// carry an `IdentityContext` extension; everything else is answered here.
pub async fn access_control(State(state): State<AccessState>, mut req: Request, next: Next) -> Response {
    let request_id = RequestId(vitrine_observability::new_request_id());
    let method = req.method().as_str().to_owned();
    let path = req.uri().path().to_owned();
    // A header that is not visible ASCII cannot hold a bearer token.
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let span = tracing::info_span!("request", request_id = %request_id, method = %method, path = %path);

    let decision = state
        .engine
        .decide(&method, &path, authorization.as_deref(), Utc::now())
        .instrument(span.clone())
        .await;

    req.extensions_mut().insert(request_id);

    let mut response = match decision {
        AccessDecision::Exempt => next.run(req).instrument(span).await,
        AccessDecision::Authenticated(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).instrument(span).await
        }
        AccessDecision::Rejected(err) => errors::auth_rejection(&err),
    };

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
