//! Role table for every guarded operation.

use std::collections::{HashMap, HashSet};

use tenantgate_core::config::AuthorizationConfig;
use tenantgate_core::error::AppError;
use tenantgate_entity::user::UserRole;

use super::operation::Operation;

/// Maps each operation to the roles allowed to perform it.
///
/// The default table keeps the historical rules as they are, including the
/// uneven ones (tenant admins cannot read their own tenant; super admins
/// cannot list tenants). Configuration may replace the role set of any
/// operation.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicies {
    table: HashMap<Operation, HashSet<UserRole>>,
}

impl AuthorizationPolicies {
    /// Default rule set.
    pub fn new() -> Self {
        use UserRole::{SuperAdmin, SuperUser, TenantAdmin, TenantUser};

        let rules: [(Operation, &[UserRole]); 14] = [
            (Operation::GetLicenceTypes, &[SuperAdmin, SuperUser]),
            (Operation::GetLicenceType, &[SuperAdmin, SuperUser]),
            (Operation::CreateLicenceType, &[SuperAdmin]),
            (Operation::UpdateLicenceType, &[SuperAdmin]),
            (Operation::DeleteLicenceType, &[SuperAdmin]),
            (Operation::GetTenant, &[TenantUser, SuperAdmin, SuperUser]),
            (Operation::GetTenants, &[TenantAdmin, TenantUser, SuperUser]),
            (Operation::UpdateTenant, &[TenantUser, SuperUser]),
            (Operation::DeleteTenant, &[TenantUser, SuperUser]),
            (Operation::GetUsers, &[TenantAdmin]),
            (Operation::GetUserRoles, &[TenantAdmin]),
            (Operation::UpdateUser, &[TenantAdmin]),
            (Operation::DeleteUser, &[TenantUser]),
            (Operation::AddUser, &UserRole::ALL),
        ];

        let table = rules
            .into_iter()
            .map(|(op, roles)| (op, roles.iter().copied().collect()))
            .collect();

        Self { table }
    }

    /// Default rules with the configured per-operation overrides applied.
    ///
    /// Unknown operation or role names are configuration errors.
    pub fn from_config(config: &AuthorizationConfig) -> Result<Self, AppError> {
        let mut policies = Self::new();
        for (name, roles) in &config.overrides {
            let op: Operation = name
                .parse()
                .map_err(|e: AppError| AppError::configuration(e.message))?;
            let roles = roles
                .iter()
                .map(|r| r.parse::<UserRole>())
                .collect::<Result<HashSet<_>, _>>()
                .map_err(|e| AppError::configuration(e.message))?;
            policies.table.insert(op, roles);
        }
        Ok(policies)
    }

    /// Whether `role` may perform `op`.
    pub fn allows(&self, role: UserRole, op: Operation) -> bool {
        self.table
            .get(&op)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Roles allowed to perform `op`.
    pub fn roles_for(&self, op: Operation) -> HashSet<UserRole> {
        self.table.get(&op).cloned().unwrap_or_default()
    }
}

impl Default for AuthorizationPolicies {
    fn default() -> Self {
        Self::new()
    }
}
