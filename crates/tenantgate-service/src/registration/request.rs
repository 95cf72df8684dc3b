//! Validated registration inputs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use tenantgate_core::types::LicenceTypeId;

/// A user to create under an existing tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Sign-up of a new tenant together with its first administrator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterTenantRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Contact email; its domain must not belong to another tenant.
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub address: String,
    /// Plan to start on; the seeded "Free" plan when absent.
    #[serde(default)]
    pub licence_type_id: Option<LicenceTypeId>,
    #[validate(nested)]
    pub admin: NewUserRequest,
}
