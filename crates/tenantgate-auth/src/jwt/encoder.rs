//! Session token issuance.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use tracing::debug;

use tenantgate_core::config::AuthConfig;
use tenantgate_core::error::{AppError, ErrorKind};

use super::claims::{Identity, SessionClaims, WireClaims};

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWS text for the `Authorization: Bearer` header.
    pub token: String,
    pub claims: SessionClaims,
}

/// Signs HS256 session tokens with the configured secret.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    lifetime: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl JwtEncoder {
    /// Build an encoder from auth configuration.
    ///
    /// Fails when the secret is empty or the lifetime is zero.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        if config.jwt_secret.is_empty() {
            return Err(AppError::configuration("JWT signing secret is empty"));
        }
        let hours = i64::try_from(config.token_lifetime_hours)
            .ok()
            .filter(|h| *h > 0)
            .ok_or_else(|| AppError::configuration("Token lifetime must be a positive number of hours"))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            lifetime: Duration::hours(hours),
        })
    }

    /// Configured token lifetime.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a token valid from now.
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, AppError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// Timestamps are truncated to whole seconds so that decoding yields
    /// exactly the returned claims.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        let iat = now.timestamp();
        let exp = iat + self.lifetime.num_seconds();

        let wire = WireClaims {
            sub: &identity.subject_id,
            tenant_id: identity.tenant_id.get(),
            email: &identity.email,
            first_name: &identity.first_name,
            last_name: &identity.last_name,
            role: identity.role,
            exp,
            iat,
        };

        let token = encode(&Header::new(Algorithm::HS256), &wire, &self.encoding_key).map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to sign session token", e)
        })?;

        let issued_at = DateTime::from_timestamp(iat, 0)
            .ok_or_else(|| AppError::internal("Issue time out of range"))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AppError::internal("Expiry time out of range"))?;

        debug!(subject = %identity.subject_id, tenant_id = %identity.tenant_id, "Session token issued");

        Ok(IssuedToken {
            token,
            claims: SessionClaims {
                subject_id: identity.subject_id.clone(),
                tenant_id: identity.tenant_id,
                email: identity.email.clone(),
                first_name: identity.first_name.clone(),
                last_name: identity.last_name.clone(),
                role: identity.role,
                issued_at,
                expires_at,
            },
        })
    }
}
