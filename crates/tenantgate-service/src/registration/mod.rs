//! Tenant and user registration.

pub mod error;
pub mod request;
pub mod service;

pub use error::RegistrationError;
pub use request::{NewUserRequest, RegisterTenantRequest};
pub use service::{RegistrationService, TenantRegistration};
