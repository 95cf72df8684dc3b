//! PostgreSQL user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tenantgate_core::error::{AppError, ErrorKind};
use tenantgate_core::result::AppResult;
use tenantgate_core::types::{TenantId, UserId};
use tenantgate_entity::user::{CreateUser, LoginAttemptState, User, UserRole};

use super::{db_count, db_id, db_limit, violates};
use crate::store::UserStore;

const USER_COLUMNS: &str = "id, tenant_id, first_name, last_name, email, password_hash, role, \
     is_active, failed_login_attempts, locked, last_login_at, last_login_ip, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    tenant_id: i64,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    failed_login_attempts: i32,
    locked: bool,
    last_login_at: Option<DateTime<Utc>>,
    last_login_ip: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = row.role.parse().map_err(|_| {
            AppError::database(format!("User {} has unknown role '{}'", row.id, row.role))
        })?;
        Ok(User {
            id: UserId::new(row.id as u64),
            tenant_id: TenantId::new(row.tenant_id as u64),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            is_active: row.is_active,
            failed_login_attempts: db_count(row.failed_login_attempts),
            locked: row.locked,
            last_login_at: row.last_login_at,
            last_login_ip: row.last_login_ip,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LoginRow {
    failed_login_attempts: i32,
    locked: bool,
    last_login_at: Option<DateTime<Utc>>,
    last_login_ip: Option<String>,
}

impl From<LoginRow> for LoginAttemptState {
    fn from(row: LoginRow) -> Self {
        Self {
            failed_attempts: db_count(row.failed_login_attempts),
            locked: row.locked,
            last_login_at: row.last_login_at,
            last_login_ip: row.last_login_ip,
        }
    }
}

/// User store backed by the `users` table.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by email", e))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(db_id(user_id.get()))
        .bind(db_id(tenant_id.get()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))?;

        row.map(User::try_from).transpose()
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (tenant_id, first_name, last_name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(db_id(data.tenant_id.get()))
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.email.trim())
        .bind(&data.password_hash)
        .bind(data.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "users_email_key") {
                AppError::conflict("Email already in use")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create user", e)
            }
        })?;

        User::try_from(row)
    }

    async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(db_id(user_id.get()))
            .bind(db_id(tenant_id.get()))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete user", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_failed_login(
        &self,
        user_id: UserId,
        threshold: u32,
    ) -> AppResult<LoginAttemptState> {
        // Right-hand sides see the pre-update row, so the lock is decided on
        // the incremented value within the same statement.
        sqlx::query_as::<_, LoginRow>(
            "UPDATE users SET failed_login_attempts = failed_login_attempts + 1, \
                              locked = locked OR failed_login_attempts + 1 >= $2, \
                              updated_at = NOW() \
             WHERE id = $1 \
             RETURNING failed_login_attempts, locked, last_login_at, last_login_ip",
        )
        .bind(db_id(user_id.get()))
        .bind(db_limit(threshold))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record failed login", e)
        })?
        .map(LoginAttemptState::from)
        .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    async fn record_successful_login(
        &self,
        user_id: UserId,
        ip: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LoginAttemptState>> {
        let row = sqlx::query_as::<_, LoginRow>(
            "UPDATE users SET failed_login_attempts = 0, last_login_at = $2, \
                              last_login_ip = $3, updated_at = NOW() \
             WHERE id = $1 AND NOT locked \
             RETURNING failed_login_attempts, locked, last_login_at, last_login_ip",
        )
        .bind(db_id(user_id.get()))
        .bind(now)
        .bind(ip)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record successful login", e)
        })?;

        if let Some(row) = row {
            return Ok(Some(LoginAttemptState::from(row)));
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(db_id(user_id.get()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up user", e))?;

        if exists {
            Ok(None)
        } else {
            Err(AppError::not_found(format!("User {user_id} not found")))
        }
    }
}
