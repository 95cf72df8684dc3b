//! Session token verification.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde_json::{Map, Value};
use tracing::debug;

use tenantgate_core::config::AuthConfig;
use tenantgate_core::error::AppError;
use tenantgate_core::types::TenantId;
use tenantgate_entity::user::UserRole;

use super::claims::{SessionClaims, names};
use crate::error::AuthError;

/// Largest integer a JSON double represents exactly (2^53).
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

type RawClaims = Map<String, Value>;

/// Verifies HS256 session tokens and reconstructs their claims.
///
/// The library only checks the signature and algorithm. Presence, type and
/// expiry of every claim are checked here so each failure maps to its own
/// [`AuthError`] variant.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl JwtDecoder {
    /// Build a decoder from auth configuration. Fails when the secret is empty.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        if config.jwt_secret.is_empty() {
            return Err(AppError::configuration("JWT signing secret is empty"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Ok(Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        })
    }

    /// Verify a token against the current time.
    pub fn decode(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// Claims are validated before expiry, so an otherwise well-formed token
    /// past its lifetime fails with [`AuthError::TokenExpired`] and nothing else.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let data = decode::<RawClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(reason = ?e.kind(), "Token rejected");
            AuthError::SignatureInvalid
        })?;

        let claims = parse_claims(&data.claims)?;
        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }
}

fn parse_claims(raw: &RawClaims) -> Result<SessionClaims, AuthError> {
    let subject_id = subject(raw)?;
    let tenant_id = TenantId::new(unsigned(raw, names::TENANT_ID)?);
    let email = text(raw, names::EMAIL)?;
    let first_name = text(raw, names::FIRST_NAME)?;
    let last_name = text(raw, names::LAST_NAME)?;
    let role = text(raw, names::ROLE)?
        .parse::<UserRole>()
        .map_err(|_| AuthError::ClaimTypeError(names::ROLE))?;
    let expires_at = timestamp(raw, names::EXP)?;
    let issued_at = timestamp(raw, names::IAT)?;

    if expires_at <= issued_at {
        return Err(AuthError::ClaimTypeError(names::EXP));
    }

    Ok(SessionClaims {
        subject_id,
        tenant_id,
        email,
        first_name,
        last_name,
        role,
        issued_at,
        expires_at,
    })
}

fn claim<'a>(raw: &'a RawClaims, name: &'static str) -> Result<&'a Value, AuthError> {
    raw.get(name).ok_or(AuthError::ClaimMissing(name))
}

fn text(raw: &RawClaims, name: &'static str) -> Result<String, AuthError> {
    match claim(raw, name)? {
        Value::String(s) => Ok(s.clone()),
        _ => Err(AuthError::ClaimTypeError(name)),
    }
}

/// `sub` is normally text; a numeric subject is accepted when it is an
/// exact unsigned integer.
fn subject(raw: &RawClaims) -> Result<String, AuthError> {
    match claim(raw, names::SUB)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) => unsigned(raw, names::SUB).map(|n| n.to_string()),
        _ => Err(AuthError::ClaimTypeError(names::SUB)),
    }
}

/// Numeric claims may arrive as JSON floats; they must still be exact
/// non-negative integers.
fn unsigned(raw: &RawClaims, name: &'static str) -> Result<u64, AuthError> {
    let Value::Number(number) = claim(raw, name)? else {
        return Err(AuthError::ClaimTypeError(name));
    };
    if let Some(n) = number.as_u64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= MAX_EXACT_FLOAT_INT => {
            Ok(f as u64)
        }
        _ => Err(AuthError::ClaimTypeError(name)),
    }
}

fn timestamp(raw: &RawClaims, name: &'static str) -> Result<DateTime<Utc>, AuthError> {
    let seconds = unsigned(raw, name)?;
    i64::try_from(seconds)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .ok_or(AuthError::ClaimTypeError(name))
}
