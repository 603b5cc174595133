//! Postgres-backed identity store.
//!
//! A profile (account, role, role permissions, direct permissions) is read
//! with one statement, so the three grant sources always come from the same
//! snapshot.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | `PoolClosed`, `PoolTimedOut`, `Io`, `Tls`, `Database` | `Unavailable` |
//! | `ColumnDecode`, `Decode`, `ColumnNotFound`, `TypeNotFound` | `Corrupt` |
//! | anything else | `Unavailable` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use vitrine_auth::{
    AccountProfile, AccountStatus, IdentityStore, LoginRecord, PermissionGrant, RoleName, RoleProfile, StoreError,
};
use vitrine_core::{AccountId, RoleId};

const PROFILE_QUERY: &str = r#"
    SELECT
        u.id,
        u.email,
        u.status,
        r.id          AS role_id,
        r.name        AS role_name,
        r.description AS role_description,
        COALESCE((
            SELECT json_agg(json_build_object('id', p.id, 'name', p.name, 'description', p.description)
                            ORDER BY p.name)
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = r.id
        ), '[]'::json) AS role_permissions,
        COALESCE((
            SELECT json_agg(json_build_object('id', p.id, 'name', p.name, 'description', p.description)
                            ORDER BY p.name)
            FROM user_permissions up
            JOIN permissions p ON p.id = up.permission_id
            WHERE up.user_id = u.id
        ), '[]'::json) AS direct_permissions
    FROM users u
    JOIN roles r ON r.id = u.role_id
    WHERE u.id = $1
"#;

const LOGIN_QUERY: &str = r#"
    SELECT id, email, password_hash, status
    FROM users
    WHERE lower(email) = lower($1)
"#;

#[derive(Debug, Clone)]
pub struct PostgresIdentityStore {
    pool: Arc<PgPool>,
}

impl PostgresIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema in `crates/infra/migrations`.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn find_account_profile(&self, id: AccountId) -> Result<Option<AccountProfile>, StoreError> {
        let row = sqlx::query(PROFILE_QUERY)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_account_profile", e))?;

        row.map(|row| ProfileRow::from_pg(&row).and_then(ProfileRow::into_profile))
            .transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_login(&self, email: &str) -> Result<Option<LoginRecord>, StoreError> {
        let row = sqlx::query(LOGIN_QUERY)
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_login", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let decode = |e| map_sqlx_error("find_login", e);
        let status: String = row.try_get("status").map_err(decode)?;

        Ok(Some(LoginRecord {
            id: AccountId::new(row.try_get("id").map_err(decode)?),
            email: row.try_get("email").map_err(decode)?,
            password_hash: row.try_get("password_hash").map_err(decode)?,
            status: parse_status(&status)?,
        }))
    }
}

#[derive(Debug)]
struct ProfileRow {
    id: i64,
    email: String,
    status: String,
    role_id: i64,
    role_name: String,
    role_description: Option<String>,
    role_permissions: serde_json::Value,
    direct_permissions: serde_json::Value,
}

impl ProfileRow {
    fn from_pg(row: &PgRow) -> Result<Self, StoreError> {
        let decode = |e| map_sqlx_error("find_account_profile", e);
        Ok(ProfileRow {
            id: row.try_get("id").map_err(decode)?,
            email: row.try_get("email").map_err(decode)?,
            status: row.try_get("status").map_err(decode)?,
            role_id: row.try_get("role_id").map_err(decode)?,
            role_name: row.try_get("role_name").map_err(decode)?,
            role_description: row.try_get("role_description").map_err(decode)?,
            role_permissions: row.try_get("role_permissions").map_err(decode)?,
            direct_permissions: row.try_get("direct_permissions").map_err(decode)?,
        })
    }

    fn into_profile(self) -> Result<AccountProfile, StoreError> {
        let role_name = RoleName::parse(self.role_name)
            .map_err(|e| StoreError::Corrupt(format!("role of account {}: {e}", self.id)))?;

        Ok(AccountProfile {
            id: AccountId::new(self.id),
            email: self.email,
            status: parse_status(&self.status)?,
            role: RoleProfile {
                id: RoleId::new(self.role_id),
                name: role_name,
                description: self.role_description,
                permissions: parse_grants(self.role_permissions)?,
            },
            permissions: parse_grants(self.direct_permissions)?,
        })
    }
}

fn parse_status(raw: &str) -> Result<AccountStatus, StoreError> {
    raw.parse().map_err(|e| StoreError::Corrupt(format!("{e}")))
}

fn parse_grants(value: serde_json::Value) -> Result<Vec<PermissionGrant>, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Corrupt(format!("permission list: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Corrupt(format!("{operation}: {err}")),
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Unavailable(format!("connection pool closed in {operation}")),
        sqlx::Error::PoolTimedOut => StoreError::Unavailable(format!("connection pool timed out in {operation}")),
        other => StoreError::Unavailable(format!("sqlx error in {operation}: {other}")),
    }
}
