//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles carried in session claims and evaluated by the authorization table.
///
/// The set is closed: tokens carrying any other role string are rejected
/// at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Administrator of a single tenant (the registering user).
    TenantAdmin,
    /// Regular member of a tenant.
    TenantUser,
    /// Platform-wide administrator.
    SuperAdmin,
    /// Platform-wide operator with read access.
    SuperUser,
}

impl UserRole {
    /// Every role, in declaration order.
    pub const ALL: [UserRole; 4] = [
        Self::TenantAdmin,
        Self::TenantUser,
        Self::SuperAdmin,
        Self::SuperUser,
    ];

    /// Return the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenantAdmin => "tenant_admin",
            Self::TenantUser => "tenant_user",
            Self::SuperAdmin => "super_admin",
            Self::SuperUser => "super_user",
        }
    }

    /// Whether the role is scoped to a single tenant.
    pub fn is_tenant_scoped(&self) -> bool {
        matches!(self, Self::TenantAdmin | Self::TenantUser)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = tenantgate_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tenant_admin" => Ok(Self::TenantAdmin),
            "tenant_user" => Ok(Self::TenantUser),
            "super_admin" => Ok(Self::SuperAdmin),
            "super_user" => Ok(Self::SuperUser),
            _ => Err(tenantgate_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: tenant_admin, tenant_user, super_admin, super_user"
            ))),
        }
    }
}
