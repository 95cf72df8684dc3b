//! Credential verifier: password check, lockout bookkeeping, token issue.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use tenantgate_core::config::AuthConfig;
use tenantgate_database::store::UserStore;

use crate::error::AuthError;
use crate::jwt::{Identity, JwtEncoder, SessionClaims};
use crate::lockout::LockoutTracker;
use crate::locks::KeyedLocks;
use crate::password::PasswordHasher;
use crate::timeout::bounded;

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Signed session token.
    pub token: String,
    pub claims: SessionClaims,
}

/// Validates email/password logins.
///
/// Rejections, in order:
/// 1. unknown email → `InvalidCredentials` (after a dummy hash check)
/// 2. inactive user → `AccountInactive`
/// 3. locked user → `AccountLocked`, whatever the password
/// 4. wrong password → failure recorded, `InvalidCredentials`
///
/// Attempts for the same email run one at a time, so a guess never reads
/// the lock flag before an earlier guess has recorded its failure.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    lockout: LockoutTracker,
    encoder: JwtEncoder,
    logins: KeyedLocks<String>,
    store_timeout: Duration,
}

impl CredentialVerifier {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        lockout: LockoutTracker,
        encoder: JwtEncoder,
        config: &AuthConfig,
    ) -> Self {
        Self {
            users,
            hasher,
            lockout,
            encoder,
            logins: KeyedLocks::new(),
            store_timeout: config.store_timeout(),
        }
    }

    /// Verify a login at the current time.
    pub async fn verify_login(
        &self,
        email: &str,
        password: &str,
        client_ip: &str,
    ) -> Result<LoginOutcome, AuthError> {
        self.verify_login_at(email, password, client_ip, Utc::now())
            .await
    }

    /// Verify a login as if the current time were `now`.
    pub async fn verify_login_at(
        &self,
        email: &str,
        password: &str,
        client_ip: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        let _guard = self.logins.acquire(email.trim().to_lowercase()).await;

        let user = bounded(
            self.store_timeout,
            "find_user_by_email",
            self.users.find_by_email(email),
        )
        .await?;

        let Some(user) = user else {
            self.hasher.verify_dummy(password);
            warn!(client_ip, "Login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            warn!(user_id = %user.id, client_ip, "Login rejected: account inactive");
            return Err(AuthError::AccountInactive);
        }

        if user.locked {
            warn!(user_id = %user.id, client_ip, "Login rejected: account locked");
            return Err(AuthError::AccountLocked);
        }

        if !self.hasher.verify_password(password, &user.password_hash)? {
            self.lockout.record_failure(user.id).await?;
            return Err(AuthError::InvalidCredentials);
        }

        self.lockout.record_success(user.id, client_ip, now).await?;
        let issued = self.encoder.issue_at(&Identity::from(&user), now)?;

        info!(
            user_id = %user.id,
            tenant_id = %user.tenant_id,
            role = %user.role,
            client_ip,
            "Login successful"
        );

        Ok(LoginOutcome {
            token: issued.token,
            claims: issued.claims,
        })
    }
}
