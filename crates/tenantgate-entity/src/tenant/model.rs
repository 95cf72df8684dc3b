//! Tenant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenantgate_core::types::TenantId;

/// An organisation registered on the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Contact email. Its domain identifies the tenant at registration.
    pub email: String,
    pub phone: String,
    pub address: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// Extract the lower-cased domain part of an email address.
///
/// Returns `None` when the address has no `@` or an empty domain.
pub fn email_domain(email: &str) -> Option<String> {
    let (_, domain) = email.trim().rsplit_once('@')?;
    if domain.is_empty() {
        return None;
    }
    Some(domain.to_ascii_lowercase())
}
