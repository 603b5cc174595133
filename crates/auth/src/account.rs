//! Account authorization profile, as read from the identity store.
//!
//! The access-control layer never mutates these records; account management
//! belongs to the entity CRUD layer.

use serde::{Deserialize, Serialize};

use vitrine_core::{AccountId, DomainError, PermissionId, RoleId};

use crate::{PermissionName, RoleName};

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Account can authenticate.
    #[default]
    Active,
    /// Account exists but has been disabled.
    Inactive,
    /// Account is temporarily blocked.
    Suspended,
}

impl AccountStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Inactive => "INACTIVE",
            AccountStatus::Suspended => "SUSPENDED",
        }
    }
}

impl core::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AccountStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AccountStatus::Active),
            "INACTIVE" => Ok(AccountStatus::Inactive),
            "SUSPENDED" => Ok(AccountStatus::Suspended),
            other => Err(DomainError::validation(format!("unknown account status {other:?}"))),
        }
    }
}

/// A permission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub id: PermissionId,
    pub name: PermissionName,
    #[serde(default)]
    pub description: Option<String>,
}

/// A role together with the permissions it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleProfile {
    pub id: RoleId,
    pub name: RoleName,
    #[serde(default)]
    pub description: Option<String>,
    pub permissions: Vec<PermissionGrant>,
}

/// An account with its role, the role's permissions and its direct grants,
/// loaded in one read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: AccountId,
    pub email: String,
    pub status: AccountStatus,
    pub role: RoleProfile,
    pub permissions: Vec<PermissionGrant>,
}

/// Minimal record needed to check a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRecord {
    pub id: AccountId,
    pub email: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    pub status: AccountStatus,
}
