//! Post-authentication authorization guards.
//!
//! Guards never re-authenticate: they only inspect the identity the access
//! decision engine attached, plus (for ownership) the request's body and path
//! parameters.

use serde_json::Value;

use crate::{AuthError, IdentityContext, PermissionName, RoleName, known};

/// Where an ownership guard looks for the resource owner's account id.
#[derive(Debug, Clone, Default)]
pub struct OwnershipSource<'a> {
    body: Option<&'a Value>,
    params: Vec<(&'a str, &'a str)>,
}

impl<'a> OwnershipSource<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: &'a Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.params.extend(params);
        self
    }

    /// Every owner value carried for `field`, body first, then path
    /// parameters. `null` counts as absent.
    fn owners(&self, field: &str) -> Vec<OwnerValue<'a>> {
        let from_body = self
            .body
            .and_then(|b| b.get(field))
            .filter(|v| !v.is_null())
            .map(OwnerValue::Json);

        let from_params = self
            .params
            .iter()
            .filter(|(name, _)| *name == field)
            .map(|(_, value)| OwnerValue::Param(value));

        from_body.into_iter().chain(from_params).collect()
    }
}

enum OwnerValue<'a> {
    Json(&'a Value),
    Param(&'a str),
}

impl OwnerValue<'_> {
    /// Numeric owner id, or `None` if the value is not an integer id.
    fn as_account_id(&self) -> Option<i64> {
        match self {
            OwnerValue::Json(Value::Number(n)) => n.as_i64(),
            OwnerValue::Json(Value::String(s)) => parse_id(s),
            OwnerValue::Json(_) => None,
            OwnerValue::Param(s) => parse_id(s),
        }
    }
}

fn parse_id(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// One authorization predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Identity's role must be one of these.
    RequireRole(Vec<RoleName>),
    /// Identity must hold every one of these permissions.
    RequirePermission(Vec<PermissionName>),
    /// Resource owner (read from `field`) must be the caller. Admins pass.
    ///
    /// When both the body and the path carry `field`, every value must name
    /// the caller. A request that does not carry `field` at all passes
    /// unchecked.
    RequireOwnership { field: String },
}

impl Guard {
    pub fn roles(roles: impl IntoIterator<Item = RoleName>) -> Self {
        Guard::RequireRole(roles.into_iter().collect())
    }

    pub fn permissions(permissions: impl IntoIterator<Item = PermissionName>) -> Self {
        Guard::RequirePermission(permissions.into_iter().collect())
    }

    pub fn ownership(field: impl Into<String>) -> Self {
        Guard::RequireOwnership { field: field.into() }
    }

    pub fn check(&self, identity: &IdentityContext, source: &OwnershipSource<'_>) -> Result<(), AuthError> {
        match self {
            Guard::RequireRole(allowed) => {
                if allowed.contains(identity.role_name()) {
                    Ok(())
                } else {
                    Err(AuthError::InsufficientRole {
                        required: allowed.clone(),
                    })
                }
            }
            Guard::RequirePermission(required) => {
                let missing = identity.permissions().missing(required);
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(AuthError::InsufficientPermission {
                        required: required.clone(),
                        missing,
                    })
                }
            }
            Guard::RequireOwnership { field } => {
                if identity.is_admin() {
                    return Ok(());
                }
                let owners = source.owners(field);
                if owners.is_empty() {
                    tracing::debug!(field = %field, "ownership field absent; not enforced");
                    return Ok(());
                }
                let caller = identity.account_id().get();
                if owners.iter().all(|owner| owner.as_account_id() == Some(caller)) {
                    Ok(())
                } else {
                    Err(AuthError::OwnershipMismatch)
                }
            }
        }
    }

    fn reads_body(&self) -> bool {
        matches!(self, Guard::RequireOwnership { .. })
    }
}

/// Ordered guards applied to one route; the first failure wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardChain {
    guards: Vec<Guard>,
}

impl GuardChain {
    pub fn new(guards: Vec<Guard>) -> Self {
        Self { guards }
    }

    pub fn then(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    /// Whether checking this chain needs the request body.
    pub fn needs_body(&self) -> bool {
        self.guards.iter().any(Guard::reads_body)
    }

    pub fn check(&self, identity: Option<&IdentityContext>, source: &OwnershipSource<'_>) -> Result<(), AuthError> {
        let identity = identity.ok_or(AuthError::AuthenticationRequired)?;
        for guard in &self.guards {
            guard.check(identity, source).inspect_err(|err| {
                tracing::info!(
                    account_id = %identity.account_id(),
                    code = err.code(),
                    "guard rejected request"
                );
            })?;
        }
        Ok(())
    }

    pub fn admin() -> Self {
        Self::new(vec![Guard::roles([RoleName::ADMIN])])
    }

    pub fn manager() -> Self {
        Self::new(vec![Guard::roles([RoleName::ADMIN, RoleName::MANAGER])])
    }

    pub fn editor() -> Self {
        Self::new(vec![Guard::roles([RoleName::ADMIN, RoleName::MANAGER, RoleName::EDITOR])])
    }

    pub fn user() -> Self {
        Self::new(vec![Guard::roles([
            RoleName::ADMIN,
            RoleName::MANAGER,
            RoleName::EDITOR,
            RoleName::USER,
        ])])
    }

    pub fn user_management() -> Self {
        Self::new(vec![Guard::permissions([known::USER_READ, known::USER_WRITE])])
    }

    pub fn content_management() -> Self {
        Self::new(vec![Guard::permissions([known::CONTENT_READ, known::CONTENT_WRITE])])
    }

    pub fn system_management() -> Self {
        Self::new(vec![Guard::permissions([known::SYSTEM_READ, known::SYSTEM_WRITE])])
    }
}
