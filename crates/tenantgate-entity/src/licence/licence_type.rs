//! Licence type (plan) entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenantgate_core::types::LicenceTypeId;

/// Name of the licence type seeded by the initial migration.
pub const FREE_LICENCE_TYPE: &str = "Free";

/// A subscription plan defining how many seats a tenant may occupy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenceType {
    pub id: LicenceTypeId,
    /// Unique plan name.
    pub name: String,
    pub description: String,
    /// Seat capacity, always greater than zero.
    pub max_seats: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a licence type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLicenceType {
    pub name: String,
    pub description: String,
    pub max_seats: u32,
}
