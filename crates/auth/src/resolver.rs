//! Identity resolution: subject id → per-request identity context.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use vitrine_core::AccountId;

use crate::{AccountProfile, AuthError, IdentityContext, LoginRecord};

/// Identity store failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("identity store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be mapped (e.g. unknown status value,
    /// malformed permission name).
    #[error("corrupt identity record: {0}")]
    Corrupt(String),
}

/// Read-only port onto the account/role/permission tables.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Account with its role, the role's permissions and the account's direct
    /// permissions, read as one consistent snapshot.
    async fn find_account_profile(&self, id: AccountId) -> Result<Option<AccountProfile>, StoreError>;

    /// Login lookup by (case-insensitive) email.
    async fn find_login(&self, email: &str) -> Result<Option<LoginRecord>, StoreError>;
}

#[async_trait]
impl<S> IdentityStore for Arc<S>
where
    S: IdentityStore + ?Sized,
{
    async fn find_account_profile(&self, id: AccountId) -> Result<Option<AccountProfile>, StoreError> {
        (**self).find_account_profile(id).await
    }

    async fn find_login(&self, email: &str) -> Result<Option<LoginRecord>, StoreError> {
        (**self).find_login(email).await
    }
}

/// Loads the authorization profile of a verified subject.
///
/// Status is rechecked on every call; nothing is cached between requests.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }

    pub async fn resolve(&self, subject: AccountId) -> Result<IdentityContext, AuthError> {
        let profile = self
            .store
            .find_account_profile(subject)
            .await
            .map_err(|e| {
                tracing::error!(account_id = %subject, error = %e, "identity lookup failed");
                AuthError::internal(e.to_string())
            })?
            .ok_or(AuthError::UnknownSubject)?;

        if profile.id != subject {
            tracing::error!(
                account_id = %subject,
                returned_id = %profile.id,
                "identity store returned a different account"
            );
            return Err(AuthError::internal("identity store returned a different account"));
        }

        if !profile.status.is_active() {
            tracing::info!(account_id = %subject, status = %profile.status, "inactive account rejected");
            return Err(AuthError::AccountNotActive);
        }

        Ok(IdentityContext::from_profile(profile))
    }
}

impl core::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityResolver").finish_non_exhaustive()
    }
}
