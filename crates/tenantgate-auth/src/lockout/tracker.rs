//! Lockout tracker backed by the user store's atomic counters.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use tenantgate_core::config::AuthConfig;
use tenantgate_core::types::UserId;
use tenantgate_database::store::UserStore;
use tenantgate_entity::user::LoginAttemptState;

use crate::error::AuthError;
use crate::timeout::bounded;

/// Records login outcomes and trips the account lock.
///
/// The counter and the lock flag are mutated by the store in one atomic
/// step, so concurrent failures for the same user never lose an increment.
#[derive(Debug, Clone)]
pub struct LockoutTracker {
    users: Arc<dyn UserStore>,
    max_failed_attempts: u32,
    store_timeout: Duration,
}

impl LockoutTracker {
    pub fn new(users: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            users,
            max_failed_attempts: config.max_failed_login_attempts.max(1),
            store_timeout: config.store_timeout(),
        }
    }

    /// Consecutive failures that lock an account.
    pub fn max_failed_attempts(&self) -> u32 {
        self.max_failed_attempts
    }

    /// Count a failed attempt, locking the account at the threshold.
    pub async fn record_failure(&self, user_id: UserId) -> Result<LoginAttemptState, AuthError> {
        let state = bounded(
            self.store_timeout,
            "record_failed_login",
            self.users.record_failed_login(user_id, self.max_failed_attempts),
        )
        .await?;

        if state.locked && state.failed_attempts == self.max_failed_attempts {
            info!(
                user_id = %user_id,
                failed_attempts = state.failed_attempts,
                "Account locked after consecutive failed logins"
            );
        } else {
            warn!(
                user_id = %user_id,
                failed_attempts = state.failed_attempts,
                "Failed login attempt"
            );
        }
        Ok(state)
    }

    /// Reset the failure counter and record where the user logged in from.
    ///
    /// Fails with `AccountLocked` when the account was locked between the
    /// caller's check and this write; the counter is left untouched.
    pub async fn record_success(
        &self,
        user_id: UserId,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginAttemptState, AuthError> {
        bounded(
            self.store_timeout,
            "record_successful_login",
            self.users.record_successful_login(user_id, ip, now),
        )
        .await?
        .ok_or_else(|| {
            warn!(user_id = %user_id, "Login refused: account locked before success was recorded");
            AuthError::AccountLocked
        })
    }
}
