//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod auth;
pub mod authorization;
pub mod licence;
pub mod logging;
pub mod rate_limit;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::authorization::AuthorizationConfig;
pub use self::licence::LicenceConfig;
pub use self::logging::LoggingConfig;
pub use self::rate_limit::RateLimitConfig;

use crate::error::AppError;

/// Environment variable prefix; keys are nested with `__`
/// (`TENANTGATE__AUTH__JWT_SECRET`).
const ENV_PREFIX: &str = "TENANTGATE";

/// Root application configuration.
///
/// Top-level deserialization target for the merged configuration
/// (base file + environment overlay + environment variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token and lockout settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Per-client request throttling.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Licence ledger settings.
    #[serde(default)]
    pub licence: LicenceConfig,
    /// Authorization table overrides.
    #[serde(default)]
    pub authorization: AuthorizationConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection acquire timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Idle connection timeout in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a base file, an environment overlay, and
    /// `TENANTGATE__*` environment variables, then validate it.
    ///
    /// The overlay is `config/{TENANTGATE_ENV}` (default `development`).
    pub fn load(config_path: &str) -> Result<Self, AppError> {
        let env = std::env::var("TENANTGATE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the core cannot run safely with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must be set"));
        }
        if self.auth.token_lifetime_hours == 0 {
            return Err(AppError::configuration(
                "auth.token_lifetime_hours must be at least 1",
            ));
        }
        if self.auth.max_failed_login_attempts == 0 {
            return Err(AppError::configuration(
                "auth.max_failed_login_attempts must be at least 1",
            ));
        }
        let rps = self.rate_limit.requests_per_second;
        if !rps.is_finite() || rps <= 0.0 {
            return Err(AppError::configuration(
                "rate_limit.requests_per_second must be a positive number",
            ));
        }
        if self.rate_limit.burst == 0 {
            return Err(AppError::configuration("rate_limit.burst must be at least 1"));
        }
        Ok(())
    }
}

fn default_database_url() -> String {
    "postgres://localhost:5432/tenantgate".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}
