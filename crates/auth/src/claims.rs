//! Session tokens: claims model, bearer parsing, HS256 signing and verification.

use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vitrine_core::AccountId;

use crate::AuthError;

/// JWT claims carried by a session token.
///
/// `sub` is the account id rendered as a decimal string; `iat`/`exp` are UNIX
/// seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(subject: AccountId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn subject(&self) -> Result<AccountId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidSignature)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Verified token payload handed to the identity resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedSession {
    pub subject: AccountId,
    pub expires_at: DateTime<Utc>,
}

/// Check the claim time window against `now`.
///
/// Signature verification happens before this; this only looks at `iat`/`exp`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<VerifiedSession, AuthError> {
    if claims.exp <= claims.iat {
        return Err(AuthError::InvalidSignature);
    }
    let expires_at = claims.expires_at().ok_or(AuthError::InvalidSignature)?;
    if now >= expires_at {
        return Err(AuthError::Expired);
    }
    Ok(VerifiedSession {
        subject: claims.subject()?,
        expires_at,
    })
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme must be `Bearer` (case-insensitive) followed by a non-empty
/// token; anything else counts as no credential at all.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?.trim();
    let (scheme, token) = header.split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Verifies session tokens.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedSession, AuthError>;
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("token lifetime must be positive and within the representable date range")]
    InvalidLifetime,
}

/// A freshly issued session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    /// Lifetime in seconds.
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

/// HS256 token codec holding the shared secret.
///
/// The same instance signs tokens at login and verifies them on every
/// request, so both sides always agree on the key.
#[derive(Clone)]
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // Expiry is checked by `validate_claims` against an injected clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, subject: AccountId, now: DateTime<Utc>, ttl: Duration) -> Result<IssuedToken, TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::InvalidLifetime);
        }
        let expires_at = now.checked_add_signed(ttl).ok_or(TokenError::InvalidLifetime)?;
        let claims = SessionClaims::new(subject, now, expires_at);
        let access_token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_in: ttl.num_seconds(),
            expires_at,
        })
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec").finish_non_exhaustive()
    }
}

impl TokenVerifier for Hs256TokenCodec {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedSession, AuthError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            AuthError::InvalidSignature
        })?;
        validate_claims(&data.claims, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-session-tokens";

    fn at(ts: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).single().unwrap()
    }

    #[test]
    fn issued_token_verifies_until_expiry() {
        let codec = Hs256TokenCodec::new(SECRET);
        let now = at(1_700_000_000);
        let issued = codec.issue(AccountId::new(7), now, Duration::hours(1)).unwrap();

        let session = codec.verify(&issued.access_token, now).unwrap();
        assert_eq!(session.subject, AccountId::new(7));
        assert_eq!(session.expires_at, now + Duration::hours(1));

        let just_before = now + Duration::hours(1) - Duration::seconds(1);
        assert!(codec.verify(&issued.access_token, just_before).is_ok());

        let at_expiry = now + Duration::hours(1);
        assert_eq!(codec.verify(&issued.access_token, at_expiry), Err(AuthError::Expired));
        assert_eq!(
            codec.verify(&issued.access_token, at_expiry + Duration::days(3)),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let now = at(1_700_000_000);
        let issued = Hs256TokenCodec::new(SECRET)
            .issue(AccountId::new(1), now, Duration::hours(1))
            .unwrap();

        let other = Hs256TokenCodec::new("some-other-secret");
        assert_eq!(other.verify(&issued.access_token, now), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn tampered_payload_is_invalid_signature() {
        let codec = Hs256TokenCodec::new(SECRET);
        let now = at(1_700_000_000);
        let issued = codec.issue(AccountId::new(1), now, Duration::hours(1)).unwrap();

        let mut parts: Vec<String> = issued.access_token.split('.').map(str::to_string).collect();
        let forged = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &SessionClaims::new(AccountId::new(2), now, now + Duration::hours(1)),
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();
        parts[1] = forged.split('.').nth(1).unwrap().to_string();
        let tampered = parts.join(".");

        assert_eq!(codec.verify(&tampered, now), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn garbage_is_invalid_signature() {
        let codec = Hs256TokenCodec::new(SECRET);
        let now = at(1_700_000_000);
        for token in ["invalid.token.here", "abc", "a.b", ""] {
            assert_eq!(codec.verify(token, now), Err(AuthError::InvalidSignature), "{token:?}");
        }
    }

    #[test]
    fn non_numeric_subject_is_invalid() {
        let codec = Hs256TokenCodec::new(SECRET);
        let now = at(1_700_000_000);
        let claims = SessionClaims {
            sub: "alice".to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + 60,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec.verify(&token, now), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let codec = Hs256TokenCodec::new(SECRET);
        let now = at(1_700_000_000);
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &SessionClaims::new(AccountId::new(1), now, now + Duration::hours(1)),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec.verify(&token, now), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn claims_window_rules() {
        let now = at(1_700_000_000);
        let inverted = SessionClaims {
            sub: "1".to_string(),
            iat: now.timestamp(),
            exp: now.timestamp(),
        };
        assert_eq!(validate_claims(&inverted, now), Err(AuthError::InvalidSignature));

        let ok = SessionClaims::new(AccountId::new(1), now, now + Duration::minutes(5));
        assert_eq!(validate_claims(&ok, now).unwrap().subject, AccountId::new(1));
    }

    #[test]
    fn non_positive_lifetime_is_refused() {
        let codec = Hs256TokenCodec::new(SECRET);
        let err = codec
            .issue(AccountId::new(1), at(1_700_000_000), Duration::zero())
            .unwrap_err();
        assert!(matches!(err, TokenError::InvalidLifetime));
    }

    #[test]
    fn lifetime_past_the_date_range_is_refused() {
        let codec = Hs256TokenCodec::new(SECRET);
        let err = codec
            .issue(AccountId::new(1), at(1_700_000_000), Duration::seconds(100_000_000_000_000))
            .unwrap_err();
        assert!(matches!(err, TokenError::InvalidLifetime));
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(parse_bearer(Some("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(parse_bearer(Some("bearer  abc ")), Ok("abc"));
        assert_eq!(parse_bearer(None), Err(AuthError::MissingToken));
        assert_eq!(parse_bearer(Some("")), Err(AuthError::MissingToken));
        assert_eq!(parse_bearer(Some("Bearer")), Err(AuthError::MissingToken));
        assert_eq!(parse_bearer(Some("Bearer   ")), Err(AuthError::MissingToken));
        assert_eq!(parse_bearer(Some("Basic dXNlcjpwYXNz")), Err(AuthError::MissingToken));
        assert_eq!(parse_bearer(Some("abc.def")), Err(AuthError::MissingToken));
    }
}
