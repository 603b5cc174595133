use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use vitrine_auth::{AccountProfile, AccountStatus, IdentityStore, LoginRecord, PermissionGrant, RoleProfile, StoreError};
use vitrine_core::AccountId;

#[derive(Debug, Clone)]
struct StoredAccount {
    profile: AccountProfile,
    password_hash: String,
}

/// In-memory identity store.
///
/// Intended for tests/dev. Changes are visible to the very next lookup, which
/// is what the per-request status recheck relies on.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    accounts: RwLock<HashMap<AccountId, StoredAccount>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account.
    pub fn insert(&self, profile: AccountProfile, password_hash: impl Into<String>) -> Result<(), StoreError> {
        let mut accounts = self.write()?;
        accounts.insert(
            profile.id,
            StoredAccount {
                profile,
                password_hash: password_hash.into(),
            },
        );
        Ok(())
    }

    pub fn remove(&self, id: AccountId) -> Result<bool, StoreError> {
        Ok(self.write()?.remove(&id).is_some())
    }

    pub fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<bool, StoreError> {
        self.update(id, |stored| stored.profile.status = status)
    }

    pub fn set_role(&self, id: AccountId, role: RoleProfile) -> Result<bool, StoreError> {
        self.update(id, |stored| stored.profile.role = role)
    }

    pub fn grant(&self, id: AccountId, permission: PermissionGrant) -> Result<bool, StoreError> {
        self.update(id, |stored| {
            if !stored.profile.permissions.iter().any(|p| p.name == permission.name) {
                stored.profile.permissions.push(permission);
            }
        })
    }

    fn update(&self, id: AccountId, f: impl FnOnce(&mut StoredAccount)) -> Result<bool, StoreError> {
        let mut accounts = self.write()?;
        Ok(accounts.get_mut(&id).map(f).is_some())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<AccountId, StoredAccount>>, StoreError> {
        self.accounts
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<AccountId, StoredAccount>>, StoreError> {
        self.accounts
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_account_profile(&self, id: AccountId) -> Result<Option<AccountProfile>, StoreError> {
        Ok(self.read()?.get(&id).map(|stored| stored.profile.clone()))
    }

    async fn find_login(&self, email: &str) -> Result<Option<LoginRecord>, StoreError> {
        let accounts = self.read()?;
        Ok(accounts
            .values()
            .find(|stored| stored.profile.email.eq_ignore_ascii_case(email))
            .map(|stored| LoginRecord {
                id: stored.profile.id,
                email: stored.profile.email.clone(),
                password_hash: stored.password_hash.clone(),
                status: stored.profile.status,
            }))
    }
}
