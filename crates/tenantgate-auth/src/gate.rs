//! Request admission: rate limit, bearer token, authorization.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use tenantgate_core::config::AppConfig;
use tenantgate_core::error::AppError;
use tenantgate_core::types::UserId;

use crate::error::AuthError;
use crate::jwt::{JwtDecoder, SessionClaims};
use crate::ratelimit::RateLimiter;
use crate::rbac::{AuthorizationGuard, AuthorizationPolicies, Operation};

const BEARER_SCHEME: &str = "bearer";

/// Composes the per-request checks in the order they must run.
///
/// A throttled client is rejected before its token is even parsed.
#[derive(Debug, Clone)]
pub struct RequestGate {
    limiter: RateLimiter,
    decoder: JwtDecoder,
    guard: AuthorizationGuard,
    eviction: Option<Arc<EvictionTask>>,
}

/// Background bucket eviction, stopped when the last gate clone drops.
#[derive(Debug)]
struct EvictionTask(JoinHandle<()>);

impl Drop for EvictionTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl RequestGate {
    pub fn new(limiter: RateLimiter, decoder: JwtDecoder, guard: AuthorizationGuard) -> Self {
        Self {
            limiter,
            decoder,
            guard,
            eviction: None,
        }
    }

    /// Build the gate from configuration.
    ///
    /// Applies the `authorization.overrides` table and, when
    /// `rate_limit.idle_eviction_seconds` is non-zero, starts idle bucket
    /// eviction on the current tokio runtime. Must be called inside a
    /// runtime.
    pub fn from_config(config: &AppConfig, decoder: JwtDecoder) -> Result<Self, AppError> {
        let policies = AuthorizationPolicies::from_config(&config.authorization)?;
        let limiter = RateLimiter::from_config(&config.rate_limit);

        let max_idle = Duration::from_secs(config.rate_limit.idle_eviction_seconds);
        let eviction = if max_idle.is_zero() {
            None
        } else {
            let every = (max_idle / 2).max(Duration::from_secs(1));
            info!(
                every_seconds = every.as_secs(),
                max_idle_seconds = max_idle.as_secs(),
                "Rate-limit eviction started"
            );
            Some(Arc::new(EvictionTask(limiter.spawn_eviction(every, max_idle))))
        };

        Ok(Self {
            limiter,
            decoder,
            guard: AuthorizationGuard::new(policies),
            eviction,
        })
    }

    /// Admit a request and return the caller's claims.
    ///
    /// `authorization` is the raw `Authorization` header value, if any.
    pub fn admit(
        &self,
        client_key: &str,
        authorization: Option<&str>,
        op: Operation,
        target: Option<UserId>,
    ) -> Result<SessionClaims, AuthError> {
        self.admit_at(client_key, authorization, op, target, Utc::now())
    }

    /// Same as [`admit`](Self::admit) with token expiry judged at `now`.
    pub fn admit_at(
        &self,
        client_key: &str,
        authorization: Option<&str>,
        op: Operation,
        target: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, AuthError> {
        if !self.limiter.admit(client_key) {
            warn!(client_key, operation = %op, "Request throttled");
            return Err(AuthError::RateLimited);
        }

        let token = bearer_token(authorization)?;
        let claims = self.decoder.decode_at(token, now)?;
        self.guard.authorize(&claims, op, target)?;
        Ok(claims)
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Whether idle bucket eviction is running for this gate.
    pub fn evicts_idle_buckets(&self) -> bool {
        self.eviction.as_ref().is_some_and(|task| !task.0.is_finished())
    }
}

/// Extract the token from `Bearer <token>`. The scheme is case-insensitive.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.map(str::trim).ok_or(AuthError::MissingBearer)?;
    let (scheme, token) = header.split_once(' ').ok_or(AuthError::MissingBearer)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) || token.is_empty() {
        return Err(AuthError::MissingBearer);
    }
    Ok(token)
}
