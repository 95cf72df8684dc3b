//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenantgate_core::types::{TenantId, UserId};

use super::role::UserRole;

/// A user belonging to exactly one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login email, unique across all tenants.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role.
    pub role: UserRole,
    /// Deactivated users cannot log in.
    pub is_active: bool,
    /// Consecutive failed login attempts.
    pub failed_login_attempts: u32,
    /// Set once the failed-attempt threshold is reached.
    pub locked: bool,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Client address of the last successful login.
    pub last_login_ip: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Snapshot of the login bookkeeping fields.
    pub fn login_state(&self) -> LoginAttemptState {
        LoginAttemptState {
            failed_attempts: self.failed_login_attempts,
            locked: self.locked,
            last_login_at: self.last_login_at,
            last_login_ip: self.last_login_ip.clone(),
        }
    }
}

/// Per-user login bookkeeping, mutated only through the lockout tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttemptState {
    /// Consecutive failed attempts since the last success.
    pub failed_attempts: u32,
    /// Whether the account is locked.
    pub locked: bool,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Client address of the last successful login.
    pub last_login_ip: Option<String>,
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login email.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Assigned role.
    pub role: UserRole,
}
