//! Persistence contracts required by the enforcement core.
//!
//! Every mutation that guards an invariant (`used_seats`, failed-attempt
//! counters) is a single atomic operation on the implementation side. Callers
//! never read-modify-write those fields themselves.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tenantgate_core::result::AppResult;
use tenantgate_core::types::{LicenceTypeId, TenantId, UserId};
use tenantgate_entity::licence::{
    CreateLicenceType, CreateTenantLicence, LicenceType, TenantLicence,
};
use tenantgate_entity::tenant::{CreateTenant, Tenant};
use tenantgate_entity::user::{CreateUser, LoginAttemptState, User};

/// Result of a keyed seat increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatIncrement {
    /// The counter moved; carries the new count.
    Applied(u32),
    /// The key was already used; carries the count recorded back then.
    Replayed(u32),
    /// The licence is full or missing.
    Refused,
}

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user by id within a tenant.
    async fn find_by_id(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<User>>;

    /// Create a user. Fails with `Conflict` when the email is taken.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Delete a user within a tenant. Returns `true` if a row was removed.
    async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool>;

    /// Increment the failed-attempt counter and, when it reaches `threshold`,
    /// set the lock flag in the same atomic step.
    ///
    /// Fails with `NotFound` when the user does not exist.
    async fn record_failed_login(&self, user_id: UserId, threshold: u32)
    -> AppResult<LoginAttemptState>;

    /// Reset the failed-attempt counter and record the login time and
    /// address, only if the account is not locked. The check and the write
    /// are one atomic step.
    ///
    /// Returns `None` when the account is locked, `NotFound` when the user
    /// does not exist.
    async fn record_successful_login(
        &self,
        user_id: UserId,
        ip: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LoginAttemptState>>;
}

/// Tenant licence persistence.
#[async_trait]
pub trait TenantLicenceStore: Send + Sync + std::fmt::Debug {
    /// Find the licence owned by a tenant.
    async fn find_by_tenant_id(&self, tenant_id: TenantId) -> AppResult<Option<TenantLicence>>;

    /// Create a licence. Fails with `Conflict` when the tenant already has one
    /// or the key is taken.
    async fn create(&self, data: &CreateTenantLicence) -> AppResult<TenantLicence>;

    /// Persist the plan and expiry of an existing licence.
    ///
    /// `used_seats` is ignored; it only moves through the atomic counters.
    async fn save(&self, licence: &TenantLicence) -> AppResult<TenantLicence>;

    /// Increment `used_seats` if and only if it is below `max_seats`.
    ///
    /// Returns the new count, or `None` when the licence is full or missing.
    async fn try_increment_used_seats(
        &self,
        tenant_id: TenantId,
        max_seats: u32,
    ) -> AppResult<Option<u32>>;

    /// Increment `used_seats` at most once per `idempotency_key`.
    ///
    /// The key is recorded in the same atomic step as the increment and
    /// remembered for `window`. A repeated key inside the window returns the
    /// count recorded the first time and changes nothing.
    async fn try_increment_used_seats_once(
        &self,
        tenant_id: TenantId,
        max_seats: u32,
        idempotency_key: &str,
        window: Duration,
    ) -> AppResult<SeatIncrement>;

    /// Decrement `used_seats`, floored at zero.
    ///
    /// Returns the new count, or `None` when the tenant has no licence.
    async fn decrement_used_seats(&self, tenant_id: TenantId) -> AppResult<Option<u32>>;
}

/// Licence type persistence.
#[async_trait]
pub trait LicenceTypeStore: Send + Sync + std::fmt::Debug {
    async fn find_by_id(&self, id: LicenceTypeId) -> AppResult<Option<LicenceType>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<LicenceType>>;

    async fn list(&self) -> AppResult<Vec<LicenceType>>;

    /// Create a licence type. Fails with `Conflict` on a duplicate name and
    /// `Validation` when `max_seats` is zero.
    async fn create(&self, data: &CreateLicenceType) -> AppResult<LicenceType>;

    /// Delete a licence type.
    ///
    /// Fails with `Conflict` while any tenant licence references it.
    async fn delete(&self, id: LicenceTypeId) -> AppResult<bool>;
}

/// Tenant persistence.
#[async_trait]
pub trait TenantStore: Send + Sync + std::fmt::Debug {
    async fn find_by_id(&self, id: TenantId) -> AppResult<Option<Tenant>>;

    /// Find the tenant registered under an email domain (lower-cased).
    async fn find_by_email_domain(&self, domain: &str) -> AppResult<Option<Tenant>>;

    /// Create a tenant. Fails with `Conflict` when the email domain is taken
    /// and `Validation` when the email has no domain.
    async fn create(&self, data: &CreateTenant) -> AppResult<Tenant>;
}
