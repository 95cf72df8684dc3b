//! Domain error type for authentication, authorization and licensing.

use thiserror::Error;

use tenantgate_core::error::AppError;

/// Every rejection the enforcement core can produce.
///
/// Each failure kind is its own variant so callers can react precisely.
/// Infrastructure failures (store errors, timeouts) travel in [`AuthError::Store`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Too many consecutive failed logins.
    #[error("account is locked")]
    AccountLocked,

    /// The user has been deactivated.
    #[error("account is inactive")]
    AccountInactive,

    /// The token's `exp` is not in the future.
    #[error("token has expired")]
    TokenExpired,

    /// Bad signature, disallowed algorithm or malformed token text.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// A required claim is absent.
    #[error("required claim '{0}' is missing")]
    ClaimMissing(&'static str),

    /// A claim is present with the wrong type or an unrepresentable value.
    #[error("claim '{0}' has an invalid type")]
    ClaimTypeError(&'static str),

    /// No `Authorization: Bearer <token>` header.
    #[error("missing bearer token")]
    MissingBearer,

    #[error("forbidden")]
    Forbidden,

    /// The tenant has no licence.
    #[error("licence not found")]
    LicenceNotFound,

    /// The licence expiry is in the past.
    #[error("licence has expired")]
    LicenceExpired,

    /// All seats of the licence are in use.
    #[error("licence seats exceeded")]
    LicenceSeatsExceeded,

    /// The referenced licence type does not exist.
    #[error("licence type not found")]
    LicenceTypeNotFound,

    /// A caller-supplied value is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The client exhausted its request budget.
    #[error("rate limit exceeded")]
    RateLimited,

    /// A store call failed or timed out.
    #[error(transparent)]
    Store(#[from] AppError),
}

impl AuthError {
    /// Only store timeouts may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountLocked
            | AuthError::AccountInactive
            | AuthError::TokenExpired
            | AuthError::SignatureInvalid
            | AuthError::ClaimMissing(_)
            | AuthError::ClaimTypeError(_)
            | AuthError::MissingBearer => AppError::authentication(message),
            AuthError::Forbidden => AppError::authorization(message),
            AuthError::LicenceNotFound
            | AuthError::LicenceExpired
            | AuthError::LicenceSeatsExceeded => AppError::license(message),
            AuthError::LicenceTypeNotFound => AppError::not_found(message),
            AuthError::InvalidArgument(_) => AppError::validation(message),
            AuthError::RateLimited => AppError::rate_limit(message),
            AuthError::Store(inner) => inner,
        }
    }
}
