//! Route classification: which requests may skip authentication.
//!
//! Classification is purely syntactic. It looks at the method and path only
//! and never at whether the addressed resource exists.

use thiserror::Error;

/// A public-access rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRule {
    /// Exact path, any method.
    ExemptAlways { path: String },
    /// Path prefix (segment-aware), safe methods only.
    PublicIfSafeMethod { prefix: String },
    /// `/{collection}/{numericId}` for the listed collections, safe methods only.
    PublicSingleResourceIfSafeMethod { collections: Vec<String> },
}

/// Which kind of rule exempted a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    ExemptAlways,
    PublicIfSafeMethod,
    PublicSingleResourceIfSafeMethod,
}

impl RouteRule {
    pub fn kind(&self) -> RuleKind {
        match self {
            RouteRule::ExemptAlways { .. } => RuleKind::ExemptAlways,
            RouteRule::PublicIfSafeMethod { .. } => RuleKind::PublicIfSafeMethod,
            RouteRule::PublicSingleResourceIfSafeMethod { .. } => RuleKind::PublicSingleResourceIfSafeMethod,
        }
    }

    /// Evaluate this rule on its own.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        match self {
            RouteRule::ExemptAlways { path: exact } => path == exact,
            RouteRule::PublicIfSafeMethod { prefix } => is_safe_method(method) && has_segment_prefix(path, prefix),
            RouteRule::PublicSingleResourceIfSafeMethod { collections } => {
                is_safe_method(method) && collections.iter().any(|c| is_single_resource(path, c))
            }
        }
    }
}

/// Read-only methods. Method names are case-sensitive, as in HTTP.
pub fn is_safe_method(method: &str) -> bool {
    matches!(method, "GET" | "HEAD")
}

/// Segment-aware prefix match. The root prefix `/` matches every path.
fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix.trim_end_matches('/')) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn is_single_resource(path: &str, collection: &str) -> bool {
    path.strip_prefix(collection.trim_end_matches('/'))
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub requires_auth: bool,
    /// First rule (in configuration order) that exempted the request.
    pub matched: Option<RuleKind>,
}

impl Classification {
    fn protected() -> Self {
        Self {
            requires_auth: true,
            matched: None,
        }
    }

    fn exempt(kind: RuleKind) -> Self {
        Self {
            requires_auth: false,
            matched: Some(kind),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteConfigError {
    #[error("route rule path {0:?} must start with '/'")]
    NotAbsolute(String),

    #[error("route rule path {0:?} must not end with '/'")]
    TrailingSlash(String),

    #[error("single-resource rule has no collections")]
    NoCollections,
}

/// Immutable set of public-access rules.
///
/// Built once at startup and shared by reference; rules are evaluated
/// independently and OR-combined, so their order only affects which rule is
/// reported in [`Classification::matched`].
#[derive(Debug, Clone, Default)]
pub struct RouteClassifier {
    rules: Vec<RouteRule>,
}

impl RouteClassifier {
    pub fn new(rules: Vec<RouteRule>) -> Result<Self, RouteConfigError> {
        for rule in &rules {
            match rule {
                RouteRule::ExemptAlways { path } => validate_path(path)?,
                RouteRule::PublicIfSafeMethod { prefix } => validate_path(prefix)?,
                RouteRule::PublicSingleResourceIfSafeMethod { collections } => {
                    if collections.is_empty() {
                        return Err(RouteConfigError::NoCollections);
                    }
                    for c in collections {
                        validate_path(c)?;
                    }
                }
            }
        }
        Ok(Self { rules })
    }

    pub fn builder() -> RouteClassifierBuilder {
        RouteClassifierBuilder::default()
    }

    /// Public surface of the content site: auth endpoints are always open,
    /// published content is readable anonymously.
    pub fn site_defaults() -> Self {
        const COLLECTIONS: [&str; 8] = [
            "/api/products",
            "/api/blogs",
            "/api/events",
            "/api/offers",
            "/api/projects",
            "/api/reviews",
            "/api/team-members",
            "/api/ads",
        ];

        let mut builder = Self::builder()
            .exempt("/api/auth/login")
            .exempt("/api/auth/register")
            .exempt("/api/auth/password-reset");
        for prefix in [
            "/api/products",
            "/api/blogs",
            "/api/events",
            "/api/faqs",
            "/api/offers",
            "/api/projects",
            "/api/reviews",
            "/api/team-members",
            "/api/ads",
            "/health",
        ] {
            builder = builder.public_prefix(prefix);
        }
        Self {
            rules: builder
                .public_collections(COLLECTIONS)
                .rules,
        }
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn classify(&self, method: &str, path: &str) -> Classification {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| Classification::exempt(rule.kind()))
            .unwrap_or_else(Classification::protected)
    }
}

fn validate_path(path: &str) -> Result<(), RouteConfigError> {
    if !path.starts_with('/') {
        return Err(RouteConfigError::NotAbsolute(path.to_string()));
    }
    if path.len() > 1 && path.ends_with('/') {
        return Err(RouteConfigError::TrailingSlash(path.to_string()));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct RouteClassifierBuilder {
    rules: Vec<RouteRule>,
}

impl RouteClassifierBuilder {
    pub fn exempt(mut self, path: impl Into<String>) -> Self {
        self.rules.push(RouteRule::ExemptAlways { path: path.into() });
        self
    }

    pub fn public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.rules.push(RouteRule::PublicIfSafeMethod { prefix: prefix.into() });
        self
    }

    pub fn public_collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(RouteRule::PublicSingleResourceIfSafeMethod {
            collections: collections.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn build(self) -> Result<RouteClassifier, RouteConfigError> {
        RouteClassifier::new(self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn site_defaults_pass_validation() {
        let defaults = RouteClassifier::site_defaults();
        assert!(RouteClassifier::new(defaults.rules().to_vec()).is_ok());
    }

    #[test]
    fn auth_endpoints_are_exempt_for_every_method() {
        let c = RouteClassifier::site_defaults();
        for method in ["GET", "POST", "PUT", "PATCH", "DELETE"] {
            for path in ["/api/auth/login", "/api/auth/register", "/api/auth/password-reset"] {
                let out = c.classify(method, path);
                assert!(!out.requires_auth, "{method} {path}");
                assert_eq!(out.matched, Some(RuleKind::ExemptAlways));
            }
        }
    }

    #[test]
    fn exempt_is_exact_match_only() {
        let c = RouteClassifier::site_defaults();
        assert!(c.classify("POST", "/api/auth/login/").requires_auth);
        assert!(c.classify("POST", "/api/auth/login/extra").requires_auth);
        assert!(c.classify("GET", "/api/auth/me").requires_auth);
    }

    #[test]
    fn public_prefix_only_for_safe_methods() {
        let c = RouteClassifier::site_defaults();
        assert!(!c.classify("GET", "/api/products").requires_auth);
        assert!(!c.classify("HEAD", "/api/blogs/featured").requires_auth);
        assert!(!c.classify("GET", "/health").requires_auth);

        assert!(c.classify("POST", "/api/products").requires_auth);
        assert!(c.classify("DELETE", "/api/blogs/3").requires_auth);
        assert!(c.classify("OPTIONS", "/api/products").requires_auth);
        assert!(c.classify("get", "/api/products").requires_auth);
    }

    #[test]
    fn prefix_respects_segment_boundaries() {
        let c = RouteClassifier::site_defaults();
        assert!(c.classify("GET", "/api/products-archive").requires_auth);
        assert!(c.classify("GET", "/healthz").requires_auth);
    }

    #[test]
    fn single_resource_rule_stands_on_its_own() {
        let c = RouteClassifier::builder()
            .public_collections(["/api/products", "/api/ads"])
            .build()
            .unwrap();

        let out = c.classify("GET", "/api/products/42");
        assert!(!out.requires_auth);
        assert_eq!(out.matched, Some(RuleKind::PublicSingleResourceIfSafeMethod));

        assert!(c.classify("GET", "/api/products").requires_auth);
        assert!(c.classify("GET", "/api/products/abc").requires_auth);
        assert!(c.classify("GET", "/api/products/42/reviews").requires_auth);
        assert!(c.classify("PUT", "/api/ads/1").requires_auth);
        assert!(c.classify("GET", "/api/users/1").requires_auth);
    }

    #[test]
    fn private_collections_require_auth() {
        let c = RouteClassifier::site_defaults();
        for path in ["/api/users", "/api/users/1", "/api/contacts", "/api/admin/dashboard", "/api/quotes/5"] {
            assert!(c.classify("GET", path).requires_auth, "{path}");
        }
    }

    #[test]
    fn any_matching_rule_exempts() {
        // Same path covered by an exempt rule and a prefix rule: the write
        // method is still exempt because one rule grants it.
        let c = RouteClassifier::builder()
            .public_prefix("/api/auth")
            .exempt("/api/auth/login")
            .build()
            .unwrap();

        assert!(!c.classify("POST", "/api/auth/login").requires_auth);
        assert_eq!(c.classify("POST", "/api/auth/login").matched, Some(RuleKind::ExemptAlways));
        assert_eq!(c.classify("GET", "/api/auth/login").matched, Some(RuleKind::PublicIfSafeMethod));
    }

    #[test]
    fn root_prefix_covers_every_path() {
        let c = RouteClassifier::builder().public_prefix("/").build().unwrap();
        for path in ["/", "/x", "/api/users/1"] {
            assert!(!c.classify("GET", path).requires_auth, "{path}");
        }
        assert!(c.classify("POST", "/x").requires_auth);
    }

    #[test]
    fn empty_classifier_protects_everything() {
        let c = RouteClassifier::default();
        assert!(c.classify("GET", "/health").requires_auth);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        assert_eq!(
            RouteClassifier::builder().exempt("api/login").build().unwrap_err(),
            RouteConfigError::NotAbsolute("api/login".to_string())
        );
        assert_eq!(
            RouteClassifier::builder().public_prefix("/api/").build().unwrap_err(),
            RouteConfigError::TrailingSlash("/api/".to_string())
        );
        assert_eq!(
            RouteClassifier::builder()
                .public_collections(Vec::<String>::new())
                .build()
                .unwrap_err(),
            RouteConfigError::NoCollections
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a numeric id on a public collection is exempt for reads
        /// whether or not such a record exists, and protected for writes.
        #[test]
        fn public_single_resource_is_existence_independent(
            id in 0u64..u64::MAX,
            collection in prop::sample::select(vec![
                "/api/products", "/api/blogs", "/api/events", "/api/offers",
                "/api/projects", "/api/reviews", "/api/team-members", "/api/ads",
            ]),
            write in prop::sample::select(vec!["POST", "PUT", "PATCH", "DELETE"]),
        ) {
            let c = RouteClassifier::site_defaults();
            let path = format!("{collection}/{id}");
            prop_assert!(!c.classify("GET", &path).requires_auth);
            prop_assert!(c.classify(write, &path).requires_auth);
        }

        /// Property: classification equals the OR of each rule evaluated alone.
        #[test]
        fn classification_is_or_of_rules(
            method in prop::sample::select(vec!["GET", "HEAD", "POST", "PUT", "DELETE"]),
            path in "/(api|health)(/[a-z-]{1,12}){0,2}(/[0-9]{1,4})?",
        ) {
            let c = RouteClassifier::site_defaults();
            let any_rule = c.rules().iter().any(|r| r.matches(method, &path));
            prop_assert_eq!(!c.classify(method, &path).requires_auth, any_rule);
        }
    }
}
