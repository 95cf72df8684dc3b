//! Guarded operations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tenantgate_core::error::AppError;

/// Every operation the authorization table has a rule for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    GetLicenceTypes,
    GetLicenceType,
    CreateLicenceType,
    UpdateLicenceType,
    DeleteLicenceType,
    GetTenant,
    GetTenants,
    UpdateTenant,
    DeleteTenant,
    GetUsers,
    GetUserRoles,
    /// Only the caller's own record.
    UpdateUser,
    /// Never the caller's own record.
    DeleteUser,
    AddUser,
}

impl Operation {
    pub const ALL: [Operation; 14] = [
        Self::GetLicenceTypes,
        Self::GetLicenceType,
        Self::CreateLicenceType,
        Self::UpdateLicenceType,
        Self::DeleteLicenceType,
        Self::GetTenant,
        Self::GetTenants,
        Self::UpdateTenant,
        Self::DeleteTenant,
        Self::GetUsers,
        Self::GetUserRoles,
        Self::UpdateUser,
        Self::DeleteUser,
        Self::AddUser,
    ];

    /// Name used in configuration overrides.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetLicenceTypes => "get-licence-types",
            Self::GetLicenceType => "get-licence-type",
            Self::CreateLicenceType => "create-licence-type",
            Self::UpdateLicenceType => "update-licence-type",
            Self::DeleteLicenceType => "delete-licence-type",
            Self::GetTenant => "get-tenant",
            Self::GetTenants => "get-tenants",
            Self::UpdateTenant => "update-tenant",
            Self::DeleteTenant => "delete-tenant",
            Self::GetUsers => "get-users",
            Self::GetUserRoles => "get-user-roles",
            Self::UpdateUser => "update-user",
            Self::DeleteUser => "delete-user",
            Self::AddUser => "add-user",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown operation: '{s}'")))
    }
}
