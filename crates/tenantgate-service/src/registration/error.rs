//! Registration failures.

use thiserror::Error;

use tenantgate_auth::AuthError;
use tenantgate_core::error::{AppError, ErrorKind};

#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The request failed field validation.
    #[error("invalid request: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    /// A tenant is already registered for the email domain.
    #[error("tenant already exists")]
    TenantAlreadyExists,

    /// The email belongs to an existing user.
    #[error("user already exists")]
    UserAlreadyExists,

    #[error("user not found")]
    UserNotFound,

    /// Licence or other enforcement rejection.
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl RegistrationError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Auth(err) => err.is_retryable(),
            Self::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Invalid(e) => AppError::validation(e.to_string()),
            RegistrationError::TenantAlreadyExists | RegistrationError::UserAlreadyExists => {
                AppError::conflict(err.to_string())
            }
            RegistrationError::UserNotFound => AppError::new(ErrorKind::NotFound, err.to_string()),
            RegistrationError::Auth(e) => e.into(),
            RegistrationError::Store(e) => e,
        }
    }
}
