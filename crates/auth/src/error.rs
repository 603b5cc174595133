//! Authentication/authorization rejection taxonomy.
//!
//! This layer stays HTTP-agnostic: each error reports a [`RejectionClass`] and
//! the transport decides which status code represents it.

use thiserror::Error;

use crate::{PermissionName, RoleName};

/// Coarse outcome class of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionClass {
    /// Caller is not (or no longer) authenticated.
    Unauthenticated,
    /// Caller is authenticated but not allowed.
    Forbidden,
    /// The decision could not be made; access is denied.
    Internal,
}

/// Why a request was rejected.
///
/// Every variant is terminal for the current request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: account no longer exists")]
    UnknownSubject,

    #[error("User account is not active")]
    AccountNotActive,

    /// A guard ran on a request that carries no identity.
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Access denied. Required roles: {}", join(.required))]
    InsufficientRole { required: Vec<RoleName> },

    #[error("Access denied. Required permissions: {}", join(.required))]
    InsufficientPermission {
        required: Vec<PermissionName>,
        missing: Vec<PermissionName>,
    },

    #[error("Access denied. You can only access your own resources.")]
    OwnershipMismatch,

    /// Unexpected failure while deciding. The detail is for logs only.
    #[error("Authentication error")]
    InternalAuthFault(String),
}

impl AuthError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::InternalAuthFault(detail.into())
    }

    pub fn class(&self) -> RejectionClass {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidSignature
            | AuthError::Expired
            | AuthError::UnknownSubject
            | AuthError::AuthenticationRequired => RejectionClass::Unauthenticated,
            AuthError::AccountNotActive
            | AuthError::InsufficientRole { .. }
            | AuthError::InsufficientPermission { .. }
            | AuthError::OwnershipMismatch => RejectionClass::Forbidden,
            AuthError::InternalAuthFault(_) => RejectionClass::Internal,
        }
    }

    /// Stable machine-readable code, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidSignature => "invalid_token",
            AuthError::Expired => "token_expired",
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::AccountNotActive => "account_not_active",
            AuthError::AuthenticationRequired => "authentication_required",
            AuthError::InsufficientRole { .. } => "insufficient_role",
            AuthError::InsufficientPermission { .. } => "insufficient_permission",
            AuthError::OwnershipMismatch => "ownership_mismatch",
            AuthError::InternalAuthFault(_) => "internal_auth_fault",
        }
    }
}

fn join<T: core::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::known;

    #[test]
    fn classes() {
        assert_eq!(AuthError::MissingToken.class(), RejectionClass::Unauthenticated);
        assert_eq!(AuthError::Expired.class(), RejectionClass::Unauthenticated);
        assert_eq!(AuthError::UnknownSubject.class(), RejectionClass::Unauthenticated);
        assert_eq!(AuthError::AccountNotActive.class(), RejectionClass::Forbidden);
        assert_eq!(AuthError::OwnershipMismatch.class(), RejectionClass::Forbidden);
        assert_eq!(AuthError::internal("db down").class(), RejectionClass::Internal);
    }

    #[test]
    fn verifier_errors_are_distinguishable() {
        let messages = [
            AuthError::MissingToken.to_string(),
            AuthError::InvalidSignature.to_string(),
            AuthError::Expired.to_string(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn messages_name_requirements() {
        let err = AuthError::InsufficientRole {
            required: vec![RoleName::ADMIN, RoleName::MANAGER],
        };
        assert_eq!(err.to_string(), "Access denied. Required roles: admin, manager");

        let err = AuthError::InsufficientPermission {
            required: vec![known::USER_READ, known::USER_WRITE],
            missing: vec![known::USER_WRITE],
        };
        assert_eq!(
            err.to_string(),
            "Access denied. Required permissions: user:read, user:write"
        );
    }

    #[test]
    fn internal_detail_is_not_in_message() {
        let err = AuthError::internal("connection refused to 10.0.0.3");
        assert_eq!(err.to_string(), "Authentication error");
        assert_eq!(err.code(), "internal_auth_fault");
    }
}
