use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitrine_auth::{AccountStatus, IdentityContext, IssuedToken, PermissionName, RoleName};
use vitrine_core::{AccountId, RoleId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub const MIN_PASSWORD_LEN: usize = 6;

    /// Shape check before touching the store; the message names the field.
    pub fn validate(&self) -> Result<(), &'static str> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err("\"email\" is required");
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err("\"email\" must be a valid email"),
        }
        if self.password.is_empty() {
            return Err("\"password\" is required");
        }
        if self.password.chars().count() < Self::MIN_PASSWORD_LEN {
            return Err("\"password\" length must be at least 6 characters long");
        }
        Ok(())
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub email: String,
    pub status: AccountStatus,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: AccountSummary,
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

impl LoginResponse {
    pub fn new(user: AccountSummary, token: IssuedToken) -> Self {
        Self {
            user,
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            expires_at: token.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleSummary {
    pub id: RoleId,
    pub name: RoleName,
}

/// Identity as seen by the caller (`/api/auth/me`) or an inspector.
#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub id: AccountId,
    pub email: String,
    pub status: AccountStatus,
    pub role: RoleSummary,
    /// Effective permissions, sorted.
    pub permissions: Vec<PermissionName>,
}

impl From<&IdentityContext> for IdentityResponse {
    fn from(identity: &IdentityContext) -> Self {
        let account = identity.account();
        Self {
            id: account.id,
            email: account.email.clone(),
            status: account.status,
            role: RoleSummary {
                id: identity.role().id,
                name: identity.role_name().clone(),
            },
            permissions: identity.permissions().iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
