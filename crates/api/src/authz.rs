//! Per-route authorization guards.
//!
//! These run after the access-control middleware and never re-authenticate;
//! they only check the attached identity against a [`GuardChain`].

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    extract::{RawPathParams, Request, State},
    http::StatusCode,
    middleware::{Next, from_fn_with_state},
    response::Response,
    routing::MethodRouter,
};
use serde_json::Value;

use vitrine_auth::{GuardChain, IdentityContext, OwnershipSource};

use crate::app::errors;

/// Largest body an ownership guard will buffer.
const MAX_GUARDED_BODY: usize = 1024 * 1024;

/// Wrap a method router so every handler on it is behind `chain`.
pub fn guarded<S>(route: MethodRouter<S>, chain: GuardChain) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(from_fn_with_state(Arc::new(chain), enforce))
}

async fn enforce(
    State(chain): State<Arc<GuardChain>>,
    params: Option<RawPathParams>,
    req: Request,
    next: Next,
) -> Response {
    let params: Vec<(&str, &str)> = params.as_ref().map(|p| p.iter().collect()).unwrap_or_default();

    let (req, body) = if chain.needs_body() {
        match buffer_json(req).await {
            Ok(pair) => pair,
            Err(response) => return response,
        }
    } else {
        (req, None)
    };

    let mut source = OwnershipSource::new().with_params(params);
    if let Some(body) = &body {
        source = source.with_body(body);
    }

    match chain.check(req.extensions().get::<IdentityContext>(), &source) {
        Ok(()) => next.run(req).await,
        Err(err) => errors::auth_rejection(&err),
    }
}

/// Read the body so the guard can inspect it, then put it back for the
/// handler. A body that is not JSON is left for the handler to reject.
async fn buffer_json(req: Request) -> Result<(Request, Option<Value>), Response> {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_GUARDED_BODY)
        .await
        .map_err(|_| errors::json_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"))?;

    let json = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&bytes).ok()
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), json))
}
