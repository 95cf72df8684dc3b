//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token signing, lockout, and store-deadline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Symmetric secret for HS256 token signing. Must not be empty.
    #[serde(default)]
    pub jwt_secret: String,
    /// Session token lifetime in hours.
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_hours: u64,
    /// Consecutive failed logins before the account is locked.
    #[serde(default = "default_max_failed")]
    pub max_failed_login_attempts: u32,
    /// Deadline applied to every user/licence store call, in milliseconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
}

impl AuthConfig {
    /// Returns the store call deadline as a `Duration`.
    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_hours: default_token_lifetime(),
            max_failed_login_attempts: default_max_failed(),
            store_timeout_ms: default_store_timeout(),
        }
    }
}

fn default_token_lifetime() -> u64 {
    10
}

fn default_max_failed() -> u32 {
    3
}

fn default_store_timeout() -> u64 {
    5_000
}
