//! Process configuration, read from the environment at startup.

use std::net::IpAddr;

use chrono::Duration;
use thiserror::Error;

use vitrine_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";

/// Upper bound on `JWT_TTL_SECONDS` (100 years).
const MAX_TOKEN_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// `None` runs against the in-memory identity store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub log_format: LogFormat,
}

impl ApiConfig {
    /// Read from the process environment (after loading `.env`, if any).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => v.trim().parse::<IpAddr>().map_err(|e| ConfigError::invalid("BIND_ADDR", &v, e))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let port = match get("PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|e| ConfigError::invalid("PORT", &v, e))?,
            None => 5000,
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let token_ttl = match get("JWT_TTL_SECONDS") {
            Some(v) => {
                let secs: i64 = v
                    .trim()
                    .parse()
                    .map_err(|e| ConfigError::invalid("JWT_TTL_SECONDS", &v, e))?;
                if secs <= 0 {
                    return Err(ConfigError::invalid("JWT_TTL_SECONDS", &v, "must be positive"));
                }
                if secs > MAX_TOKEN_TTL_SECS {
                    return Err(ConfigError::invalid("JWT_TTL_SECONDS", &v, "exceeds 100 years"));
                }
                Duration::try_seconds(secs)
                    .ok_or_else(|| ConfigError::invalid("JWT_TTL_SECONDS", &v, "out of range"))?
            }
            None => Duration::days(1),
        };

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => {
                let n: u32 = v
                    .trim()
                    .parse()
                    .map_err(|e| ConfigError::invalid("DATABASE_MAX_CONNECTIONS", &v, e))?;
                if n == 0 {
                    return Err(ConfigError::invalid("DATABASE_MAX_CONNECTIONS", &v, "must be at least 1"));
                }
                n
            }
            None => 5,
        };

        let log_format = match get("LOG_FORMAT") {
            Some(v) => v.parse::<LogFormat>().map_err(|e| ConfigError::invalid("LOG_FORMAT", &v, e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            port,
            jwt_secret,
            token_ttl,
            database_url: get("DATABASE_URL"),
            database_max_connections,
            log_format,
        })
    }

    /// `JWT_SECRET` was unset and the insecure default is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("token_ttl", &self.token_ttl)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}
