//! Authorization guard: role table plus self-targeting rules.

use tracing::warn;

use tenantgate_core::types::UserId;
use tenantgate_entity::user::UserRole;

use super::operation::Operation;
use super::policies::AuthorizationPolicies;
use crate::error::AuthError;
use crate::jwt::SessionClaims;

/// Decides whether a caller may perform an operation.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationGuard {
    policies: AuthorizationPolicies,
}

impl AuthorizationGuard {
    pub fn new(policies: AuthorizationPolicies) -> Self {
        Self { policies }
    }

    /// Pure role check against the table.
    pub fn allow(&self, role: UserRole, op: Operation) -> bool {
        self.policies.allows(role, op)
    }

    /// Full decision for a decoded caller.
    ///
    /// `target` is the user the operation acts on, when there is one.
    /// Deleting oneself is always forbidden; updating a user is only
    /// permitted on oneself. Every denial is the same `Forbidden`.
    pub fn authorize(
        &self,
        claims: &SessionClaims,
        op: Operation,
        target: Option<UserId>,
    ) -> Result<(), AuthError> {
        if !self.allow(claims.role, op) {
            return Err(deny(claims, op, "role not permitted"));
        }

        let targets_self = target.is_some_and(|id| claims.is_subject(&id.to_string()));
        match op {
            Operation::DeleteUser if targets_self => Err(deny(claims, op, "self-deletion")),
            Operation::UpdateUser if !targets_self => Err(deny(claims, op, "not own record")),
            _ => Ok(()),
        }
    }

    pub fn policies(&self) -> &AuthorizationPolicies {
        &self.policies
    }
}

fn deny(claims: &SessionClaims, op: Operation, reason: &'static str) -> AuthError {
    warn!(
        subject = %claims.subject_id,
        tenant_id = %claims.tenant_id,
        role = %claims.role,
        operation = %op,
        reason,
        "Operation forbidden"
    );
    AuthError::Forbidden
}
