use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use vitrine_core::{DomainError, DomainResult};

use crate::roles::validate_name;

/// Permission identifier (e.g. `"user:read"`, `"content:write"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName(Cow<'static, str>);

impl PermissionName {
    /// Validate and wrap a permission name.
    pub fn parse(name: impl Into<Cow<'static, str>>) -> DomainResult<Self> {
        let name = name.into();
        validate_name("permission", &name)?;
        Ok(Self(name))
    }

    /// Wrap a compile-time constant.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PermissionName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PermissionName> for String {
    fn from(value: PermissionName) -> Self {
        value.0.into_owned()
    }
}

/// Well-known permission names used by the built-in guard presets.
pub mod known {
    use super::PermissionName;

    pub const USER_READ: PermissionName = PermissionName::from_static("user:read");
    pub const USER_WRITE: PermissionName = PermissionName::from_static("user:write");
    pub const USER_CREATE: PermissionName = PermissionName::from_static("user:create");
    pub const USER_UPDATE: PermissionName = PermissionName::from_static("user:update");
    pub const USER_DELETE: PermissionName = PermissionName::from_static("user:delete");

    pub const CONTENT_READ: PermissionName = PermissionName::from_static("content:read");
    pub const CONTENT_WRITE: PermissionName = PermissionName::from_static("content:write");
    pub const CONTENT_CREATE: PermissionName = PermissionName::from_static("content:create");
    pub const CONTENT_UPDATE: PermissionName = PermissionName::from_static("content:update");
    pub const CONTENT_DELETE: PermissionName = PermissionName::from_static("content:delete");

    pub const SYSTEM_READ: PermissionName = PermissionName::from_static("system:read");
    pub const SYSTEM_WRITE: PermissionName = PermissionName::from_static("system:write");
}

/// The union of a role's inherited permissions and an account's direct grants.
///
/// Backed by an ordered set: insertion order and duplicates never affect
/// equality, and iteration is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EffectivePermissionSet(BTreeSet<PermissionName>);

impl EffectivePermissionSet {
    /// Build the set from the two grant sources.
    pub fn from_sources<'a, R, D>(role_permissions: R, direct_permissions: D) -> Self
    where
        R: IntoIterator<Item = &'a PermissionName>,
        D: IntoIterator<Item = &'a PermissionName>,
    {
        Self(
            role_permissions
                .into_iter()
                .chain(direct_permissions)
                .cloned()
                .collect(),
        )
    }

    pub fn contains(&self, permission: &PermissionName) -> bool {
        self.0.contains(permission)
    }

    /// `true` iff every name in `required` is present.
    pub fn contains_all<'a>(&self, required: impl IntoIterator<Item = &'a PermissionName>) -> bool {
        required.into_iter().all(|p| self.0.contains(p))
    }

    /// Names in `required` that are absent, in the order given.
    pub fn missing<'a>(
        &self,
        required: impl IntoIterator<Item = &'a PermissionName>,
    ) -> Vec<PermissionName> {
        required
            .into_iter()
            .filter(|p| !self.0.contains(*p))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionName> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PermissionName> for EffectivePermissionSet {
    fn from_iter<I: IntoIterator<Item = PermissionName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
