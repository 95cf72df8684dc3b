//! Session claims carried inside every token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenantgate_core::types::TenantId;
use tenantgate_entity::user::{User, UserRole};

/// Decoded, validated identity of a caller.
///
/// Only the codec constructs values of this type: [`JwtEncoder`] on issue
/// and [`JwtDecoder`] after every claim has been checked.
///
/// [`JwtEncoder`]: super::JwtEncoder
/// [`JwtDecoder`]: super::JwtDecoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (the user id, as text).
    pub subject_id: String,
    pub tenant_id: TenantId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    /// Issue time, whole seconds.
    pub issued_at: DateTime<Utc>,
    /// Expiry time, whole seconds, always after `issued_at`.
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Whether the token has lapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether these claims identify the given subject.
    pub fn is_subject(&self, subject_id: &str) -> bool {
        self.subject_id == subject_id
    }
}

/// The identity a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub tenant_id: TenantId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            subject_id: user.id.to_string(),
            tenant_id: user.tenant_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        }
    }
}

/// Claim names on the wire.
pub(crate) mod names {
    pub const SUB: &str = "sub";
    pub const TENANT_ID: &str = "tenant_id";
    pub const EMAIL: &str = "email";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const ROLE: &str = "role";
    pub const EXP: &str = "exp";
    pub const IAT: &str = "iat";
}

/// Exact wire payload; field names must match [`names`].
#[derive(Debug, Serialize)]
pub(crate) struct WireClaims<'a> {
    pub sub: &'a str,
    pub tenant_id: u64,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}
