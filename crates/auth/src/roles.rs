use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use vitrine_core::{DomainError, DomainResult};

/// Name of a role used for RBAC (e.g. `"admin"`, `"manager"`).
///
/// Names are validated on construction so a misspelled role in a guard
/// definition is caught when the guard is built rather than silently denying
/// every request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub const ADMIN: RoleName = RoleName::from_static("admin");
    pub const MANAGER: RoleName = RoleName::from_static("manager");
    pub const EDITOR: RoleName = RoleName::from_static("editor");
    pub const USER: RoleName = RoleName::from_static("user");

    /// Validate and wrap a role name.
    pub fn parse(name: impl Into<Cow<'static, str>>) -> DomainResult<Self> {
        let name = name.into();
        validate_name("role", &name)?;
        Ok(Self(name))
    }

    /// Wrap a compile-time constant. Callers are responsible for using a
    /// well-formed name.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == Self::ADMIN.as_str()
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoleName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0.into_owned()
    }
}

pub(crate) const MAX_NAME_LEN: usize = 64;

/// Shared rule for role and permission names: non-empty, bounded, and limited
/// to lowercase ASCII letters, digits and `:` `.` `_` `-`.
pub(crate) fn validate_name(kind: &str, name: &str) -> DomainResult<()> {
    if name.is_empty() {
        return Err(DomainError::validation(format!("{kind} name cannot be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "{kind} name exceeds {MAX_NAME_LEN} bytes"
        )));
    }
    let valid = name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b':' | b'.' | b'_' | b'-'));
    if !valid {
        return Err(DomainError::validation(format!(
            "{kind} name {name:?} contains characters outside [a-z0-9:._-]"
        )));
    }
    Ok(())
}
