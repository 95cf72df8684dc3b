//! Shared value types.

pub mod id;

pub use id::{LicenceTypeId, TenantId, TenantLicenceId, UserId};
