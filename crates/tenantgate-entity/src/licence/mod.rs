//! Licence entities: licence types (plans) and per-tenant licences.

pub mod licence_type;
pub mod model;

pub use licence_type::{CreateLicenceType, LicenceType};
pub use model::{CreateTenantLicence, LicenceSummary, TenantLicence};
