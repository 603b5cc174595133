//! Access decision engine: the single global authentication gate.
//!
//! `Unclassified → Exempt` or
//! `Unclassified → Protected → Authenticated | Rejected(reason)`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;

use crate::{AuthError, IdentityContext, IdentityResolver, RouteClassifier, TokenVerifier, claims::parse_bearer};

/// Terminal outcome of the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Public route; no identity is attached.
    Exempt,
    /// Protected route with a verified, active identity.
    Authenticated(IdentityContext),
    Rejected(AuthError),
}

impl AccessDecision {
    pub fn is_pass(&self) -> bool {
        !matches!(self, AccessDecision::Rejected(_))
    }
}

/// Classifies the route, verifies the bearer token and resolves the identity.
///
/// All collaborators are immutable and shared; the engine keeps no
/// per-request state.
#[derive(Clone)]
pub struct AccessDecisionEngine {
    classifier: Arc<RouteClassifier>,
    verifier: Arc<dyn TokenVerifier>,
    resolver: IdentityResolver,
}

impl AccessDecisionEngine {
    pub fn new(classifier: Arc<RouteClassifier>, verifier: Arc<dyn TokenVerifier>, resolver: IdentityResolver) -> Self {
        Self {
            classifier,
            verifier,
            resolver,
        }
    }

    pub fn classifier(&self) -> &RouteClassifier {
        &self.classifier
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    #[tracing::instrument(name = "access_decision", skip(self, authorization, now))]
    pub async fn decide(
        &self,
        method: &str,
        path: &str,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> AccessDecision {
        let classification = self.classifier.classify(method, path);
        if !classification.requires_auth {
            tracing::trace!(rule = ?classification.matched, "public route");
            return AccessDecision::Exempt;
        }

        // A panic while verifying or resolving must never turn into a pass.
        let outcome = AssertUnwindSafe(self.authenticate(authorization, now))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(AuthError::internal(panic_message(payload.as_ref()))));

        match outcome {
            Ok(identity) => {
                tracing::debug!(account_id = %identity.account_id(), role = %identity.role_name(), "authenticated");
                AccessDecision::Authenticated(identity)
            }
            Err(err) => {
                match &err {
                    AuthError::InternalAuthFault(detail) => {
                        tracing::error!(code = err.code(), detail = %detail, "access decision failed")
                    }
                    _ => tracing::info!(code = err.code(), "request rejected"),
                }
                AccessDecision::Rejected(err)
            }
        }
    }

    async fn authenticate(&self, authorization: Option<&str>, now: DateTime<Utc>) -> Result<IdentityContext, AuthError> {
        let token = parse_bearer(authorization)?;
        let session = self.verifier.verify(token, now)?;
        self.resolver.resolve(session.subject).await
    }
}

impl core::fmt::Debug for AccessDecisionEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccessDecisionEngine")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::resolver::tests::{FixedStore, profile};
    use crate::{
        AccountProfile, AccountStatus, Hs256TokenCodec, IdentityStore, LoginRecord, RoleName, StoreError,
    };
    use vitrine_core::AccountId;

    const SECRET: &str = "engine-test-secret";

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
    }

    fn engine_with(store: Arc<dyn IdentityStore>) -> AccessDecisionEngine {
        AccessDecisionEngine::new(
            Arc::new(RouteClassifier::site_defaults()),
            Arc::new(Hs256TokenCodec::new(SECRET)),
            IdentityResolver::new(store),
        )
    }

    fn engine() -> AccessDecisionEngine {
        let profiles = [
            profile(7, RoleName::EDITOR, AccountStatus::Active),
            profile(8, RoleName::USER, AccountStatus::Inactive),
        ];
        engine_with(Arc::new(FixedStore {
            profiles: profiles.into_iter().map(|p| (p.id, p)).collect(),
            fail: None,
        }))
    }

    fn bearer_for(id: i64) -> String {
        let issued = Hs256TokenCodec::new(SECRET)
            .issue(AccountId::new(id), now(), Duration::hours(1))
            .unwrap();
        format!("Bearer {}", issued.access_token)
    }

    #[tokio::test]
    async fn public_routes_pass_without_identity_regardless_of_header() {
        let engine = engine();
        for header in [None, Some("Bearer garbage"), Some("Basic abc"), Some("")] {
            assert_eq!(engine.decide("GET", "/api/products/42", header, now()).await, AccessDecision::Exempt);
            assert_eq!(engine.decide("POST", "/api/auth/login", header, now()).await, AccessDecision::Exempt);
        }
    }

    #[tokio::test]
    async fn write_on_public_prefix_requires_token() {
        let decision = engine().decide("POST", "/api/products", None, now()).await;
        assert_eq!(decision, AccessDecision::Rejected(AuthError::MissingToken));
    }

    #[tokio::test]
    async fn valid_token_attaches_identity() {
        let header = bearer_for(7);
        let decision = engine().decide("GET", "/api/users", Some(header.as_str()), now()).await;

        match decision {
            AccessDecision::Authenticated(identity) => {
                assert_eq!(identity.account_id(), AccountId::new(7));
                assert_eq!(identity.role_name(), &RoleName::EDITOR);
            }
            other => panic!("expected authenticated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn verifier_and_resolver_failures_are_terminal() {
        let engine = engine();

        let bad = engine
            .decide("GET", "/api/users", Some("Bearer invalid.token.here"), now())
            .await;
        assert_eq!(bad, AccessDecision::Rejected(AuthError::InvalidSignature));

        let header = bearer_for(7);
        let late = engine
            .decide("GET", "/api/users", Some(header.as_str()), now() + Duration::hours(2))
            .await;
        assert_eq!(late, AccessDecision::Rejected(AuthError::Expired));

        let header = bearer_for(404);
        let gone = engine.decide("GET", "/api/users", Some(header.as_str()), now()).await;
        assert_eq!(gone, AccessDecision::Rejected(AuthError::UnknownSubject));

        let header = bearer_for(8);
        let inactive = engine.decide("GET", "/api/users", Some(header.as_str()), now()).await;
        assert_eq!(inactive, AccessDecision::Rejected(AuthError::AccountNotActive));
    }

    #[tokio::test]
    async fn store_outage_fails_closed() {
        let engine = engine_with(Arc::new(FixedStore {
            profiles: HashMap::new(),
            fail: Some(StoreError::Unavailable("pool timed out".to_string())),
        }));
        let header = bearer_for(7);

        let decision = engine.decide("GET", "/api/users", Some(header.as_str()), now()).await;
        assert!(matches!(decision, AccessDecision::Rejected(AuthError::InternalAuthFault(_))));
        assert!(!decision.is_pass());
    }

    struct PanickingStore;

    #[async_trait]
    impl IdentityStore for PanickingStore {
        async fn find_account_profile(&self, _id: AccountId) -> Result<Option<AccountProfile>, StoreError> {
            panic!("driver bug")
        }

        async fn find_login(&self, _email: &str) -> Result<Option<LoginRecord>, StoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn panic_during_resolution_is_internal_fault() {
        let engine = engine_with(Arc::new(PanickingStore));
        let header = bearer_for(7);

        let decision = engine.decide("DELETE", "/api/users/7", Some(header.as_str()), now()).await;
        assert_eq!(
            decision,
            AccessDecision::Rejected(AuthError::internal("panic: driver bug"))
        );
    }
}
