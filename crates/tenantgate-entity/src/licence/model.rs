//! Tenant licence entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenantgate_core::types::{LicenceTypeId, TenantId, TenantLicenceId};

/// The licence held by a tenant. Exactly one per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantLicence {
    /// Unique licence identifier.
    pub id: TenantLicenceId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Current plan.
    pub licence_type_id: LicenceTypeId,
    /// Opaque unique key handed to the tenant.
    pub licence_key: String,
    /// Seats currently occupied. Never exceeds the plan's `max_seats`.
    pub used_seats: u32,
    /// Expiry, or `None` for a licence that never expires.
    pub expiry_date: Option<DateTime<Utc>>,
    /// When the licence was created.
    pub created_at: DateTime<Utc>,
    /// When the licence was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TenantLicence {
    /// Check whether the licence has lapsed at the given instant.
    ///
    /// A licence expiring exactly at `now` counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry <= now)
    }
}

/// Data required to create a tenant licence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenantLicence {
    pub tenant_id: TenantId,
    pub licence_type_id: LicenceTypeId,
    pub licence_key: String,
    pub used_seats: u32,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Read model joining a tenant licence with its plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenceSummary {
    pub licence_id: TenantLicenceId,
    pub tenant_id: TenantId,
    pub licence_key: String,
    pub licence_type_name: String,
    pub max_seats: u32,
    pub used_seats: u32,
    pub expiry_date: Option<DateTime<Utc>>,
}
