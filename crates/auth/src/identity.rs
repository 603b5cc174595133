use serde::Serialize;

use vitrine_core::{AccountId, RoleId};

use crate::{AccountProfile, AccountStatus, EffectivePermissionSet, PermissionName, RoleName};

/// The authenticated account, as seen by downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityAccount {
    pub id: AccountId,
    pub email: String,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityRole {
    pub id: RoleId,
    pub name: RoleName,
}

/// Identity established for one request.
///
/// Built fresh from the identity store on every authenticated request and
/// dropped with the request; it is never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityContext {
    account: IdentityAccount,
    role: IdentityRole,
    permissions: EffectivePermissionSet,
}

impl IdentityContext {
    pub fn new(account: IdentityAccount, role: IdentityRole, permissions: EffectivePermissionSet) -> Self {
        Self {
            account,
            role,
            permissions,
        }
    }

    /// Derive the context from a loaded profile, computing the effective
    /// permission set.
    pub fn from_profile(profile: AccountProfile) -> Self {
        let permissions = EffectivePermissionSet::from_sources(
            profile.role.permissions.iter().map(|g| &g.name),
            profile.permissions.iter().map(|g| &g.name),
        );

        Self {
            account: IdentityAccount {
                id: profile.id,
                email: profile.email,
                status: profile.status,
            },
            role: IdentityRole {
                id: profile.role.id,
                name: profile.role.name,
            },
            permissions,
        }
    }

    pub fn account(&self) -> &IdentityAccount {
        &self.account
    }

    pub fn account_id(&self) -> AccountId {
        self.account.id
    }

    pub fn role(&self) -> &IdentityRole {
        &self.role
    }

    pub fn role_name(&self) -> &RoleName {
        &self.role.name
    }

    pub fn is_admin(&self) -> bool {
        self.role.name.is_admin()
    }

    pub fn permissions(&self) -> &EffectivePermissionSet {
        &self.permissions
    }

    pub fn has_permission(&self, permission: &PermissionName) -> bool {
        self.permissions.contains(permission)
    }
}
