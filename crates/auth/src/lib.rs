//! `vitrine-auth` — access control for the content site API.
//!
//! Token verification, identity resolution, route classification and
//! authorization guards. The crate knows nothing about HTTP or SQL: the API
//! crate maps [`AuthError`] classes to status codes, and the infra crate
//! implements [`IdentityStore`].

pub mod account;
pub mod claims;
pub mod engine;
pub mod error;
pub mod guards;
pub mod identity;
pub mod password;
pub mod permissions;
pub mod resolver;
pub mod roles;
pub mod routes;

pub use account::{AccountProfile, AccountStatus, LoginRecord, PermissionGrant, RoleProfile};
pub use claims::{
    Hs256TokenCodec, IssuedToken, SessionClaims, TokenError, TokenVerifier, VerifiedSession, parse_bearer,
    validate_claims,
};
pub use engine::{AccessDecision, AccessDecisionEngine};
pub use error::{AuthError, RejectionClass};
pub use guards::{Guard, GuardChain, OwnershipSource};
pub use identity::{IdentityAccount, IdentityContext, IdentityRole};
pub use password::{PasswordError, hash_password, verify_dummy_password, verify_password};
pub use permissions::{EffectivePermissionSet, PermissionName, known};
pub use resolver::{IdentityResolver, IdentityStore, StoreError};
pub use roles::RoleName;
pub use routes::{Classification, RouteClassifier, RouteClassifierBuilder, RouteConfigError, RouteRule, RuleKind};
