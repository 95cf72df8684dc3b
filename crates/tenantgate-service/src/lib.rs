//! # tenantgate-service
//!
//! Registration workflows built on the enforcement core: tenant sign-up,
//! adding users against the tenant's seat licence, and removing them.

pub mod registration;

pub use registration::{
    NewUserRequest, RegisterTenantRequest, RegistrationError, RegistrationService,
    TenantRegistration,
};
