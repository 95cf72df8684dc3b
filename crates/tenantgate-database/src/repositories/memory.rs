//! In-memory store with the same semantics as the PostgreSQL repositories.
//!
//! Every operation takes the single state lock for its whole duration, which
//! gives the conditional seat increment and the failed-login increment the
//! same atomicity the SQL statements have. Used by tests and local runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use tenantgate_core::error::AppError;
use tenantgate_core::result::AppResult;
use tenantgate_core::types::{LicenceTypeId, TenantId, TenantLicenceId, UserId};
use tenantgate_entity::licence::{
    CreateLicenceType, CreateTenantLicence, LicenceType, TenantLicence,
    licence_type::FREE_LICENCE_TYPE,
};
use tenantgate_entity::tenant::{CreateTenant, Tenant, email_domain};
use tenantgate_entity::user::{CreateUser, LoginAttemptState, User};

use crate::store::{LicenceTypeStore, SeatIncrement, TenantLicenceStore, TenantStore, UserStore};

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    users: HashMap<UserId, User>,
    tenants: HashMap<TenantId, Tenant>,
    licences: HashMap<TenantId, TenantLicence>,
    licence_types: BTreeMap<LicenceTypeId, LicenceType>,
    reservations: HashMap<(TenantId, String), (u32, DateTime<Utc>)>,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_mut(&mut self, user_id: UserId) -> AppResult<&mut User> {
        self.users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }
}

/// Implements every store contract over one shared, mutex-protected state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create a store seeded with the "Free" licence type, like a freshly
    /// migrated database.
    pub fn new() -> Self {
        let now = Utc::now();
        let mut inner = Inner::default();
        let id = LicenceTypeId::new(inner.next_id());
        inner.licence_types.insert(
            id,
            LicenceType {
                id,
                name: FREE_LICENCE_TYPE.to_string(),
                description: "Single-seat plan assigned by default".to_string(),
                max_seats: 1,
                created_at: now,
                updated_at: now,
            },
        );
        Self {
            state: Arc::new(Mutex::new(inner)),
        }
    }

    /// Flip a user's active flag. Returns `false` when the user is unknown.
    pub async fn set_user_active(&self, user_id: UserId, active: bool) -> bool {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.is_active = active;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        let email = email.trim();
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(&user_id)
            .filter(|u| u.tenant_id == tenant_id)
            .cloned())
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        let email = data.email.trim();
        if state.users.values().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(AppError::conflict("Email already in use"));
        }
        if !state.tenants.contains_key(&data.tenant_id) {
            return Err(AppError::not_found(format!(
                "Tenant {} not found",
                data.tenant_id
            )));
        }

        let now = Utc::now();
        let id = UserId::new(state.next_id());
        let user = User {
            id,
            tenant_id: data.tenant_id,
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            email: email.to_string(),
            password_hash: data.password_hash.clone(),
            role: data.role,
            is_active: true,
            failed_login_attempts: 0,
            locked: false,
            last_login_at: None,
            last_login_ip: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.users.get(&user_id) {
            Some(user) if user.tenant_id == tenant_id => {
                state.users.remove(&user_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_failed_login(
        &self,
        user_id: UserId,
        threshold: u32,
    ) -> AppResult<LoginAttemptState> {
        let mut state = self.state.lock().await;
        let user = state.user_mut(user_id)?;
        user.failed_login_attempts = user.failed_login_attempts.saturating_add(1);
        if user.failed_login_attempts >= threshold {
            user.locked = true;
        }
        user.updated_at = Utc::now();
        Ok(user.login_state())
    }

    async fn record_successful_login(
        &self,
        user_id: UserId,
        ip: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LoginAttemptState>> {
        let mut state = self.state.lock().await;
        let user = state.user_mut(user_id)?;
        if user.locked {
            return Ok(None);
        }
        user.failed_login_attempts = 0;
        user.last_login_at = Some(now);
        user.last_login_ip = Some(ip.to_string());
        user.updated_at = Utc::now();
        Ok(Some(user.login_state()))
    }
}

#[async_trait]
impl TenantLicenceStore for MemoryStore {
    async fn find_by_tenant_id(&self, tenant_id: TenantId) -> AppResult<Option<TenantLicence>> {
        let state = self.state.lock().await;
        Ok(state.licences.get(&tenant_id).cloned())
    }

    async fn create(&self, data: &CreateTenantLicence) -> AppResult<TenantLicence> {
        let mut state = self.state.lock().await;
        if state.licences.contains_key(&data.tenant_id) {
            return Err(AppError::conflict(format!(
                "Tenant {} already has a licence",
                data.tenant_id
            )));
        }
        if state
            .licences
            .values()
            .any(|l| l.licence_key == data.licence_key)
        {
            return Err(AppError::conflict("Licence key already in use"));
        }
        if !state.tenants.contains_key(&data.tenant_id)
            || !state.licence_types.contains_key(&data.licence_type_id)
        {
            return Err(AppError::not_found("Tenant or licence type does not exist"));
        }

        let now = Utc::now();
        let licence = TenantLicence {
            id: TenantLicenceId::new(state.next_id()),
            tenant_id: data.tenant_id,
            licence_type_id: data.licence_type_id,
            licence_key: data.licence_key.clone(),
            used_seats: data.used_seats,
            expiry_date: data.expiry_date,
            created_at: now,
            updated_at: now,
        };
        state.licences.insert(data.tenant_id, licence.clone());
        Ok(licence)
    }

    async fn save(&self, licence: &TenantLicence) -> AppResult<TenantLicence> {
        let mut state = self.state.lock().await;
        if !state.licence_types.contains_key(&licence.licence_type_id) {
            return Err(AppError::not_found(format!(
                "Licence type {} not found",
                licence.licence_type_id
            )));
        }
        let stored = state.licences.get_mut(&licence.tenant_id).ok_or_else(|| {
            AppError::not_found(format!("Tenant {} has no licence", licence.tenant_id))
        })?;
        stored.licence_type_id = licence.licence_type_id;
        stored.expiry_date = licence.expiry_date;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn try_increment_used_seats(
        &self,
        tenant_id: TenantId,
        max_seats: u32,
    ) -> AppResult<Option<u32>> {
        let mut state = self.state.lock().await;
        Ok(state
            .licences
            .get_mut(&tenant_id)
            .filter(|l| l.used_seats < max_seats)
            .map(|l| {
                l.used_seats += 1;
                l.updated_at = Utc::now();
                l.used_seats
            }))
    }

    async fn try_increment_used_seats_once(
        &self,
        tenant_id: TenantId,
        max_seats: u32,
        idempotency_key: &str,
        window: Duration,
    ) -> AppResult<SeatIncrement> {
        let mut state = self.state.lock().await;
        if !state.licences.contains_key(&tenant_id) {
            return Ok(SeatIncrement::Refused);
        }

        let now = Utc::now();
        let key = (tenant_id, idempotency_key.to_string());
        if let Some((seats, created_at)) = state.reservations.get(&key) {
            let age = (now - *created_at).to_std().unwrap_or_default();
            if age < window {
                return Ok(SeatIncrement::Replayed(*seats));
            }
        }

        let Some(licence) = state
            .licences
            .get_mut(&tenant_id)
            .filter(|l| l.used_seats < max_seats)
        else {
            return Ok(SeatIncrement::Refused);
        };
        licence.used_seats += 1;
        licence.updated_at = now;
        let seats = licence.used_seats;
        state.reservations.insert(key, (seats, now));
        Ok(SeatIncrement::Applied(seats))
    }

    async fn decrement_used_seats(&self, tenant_id: TenantId) -> AppResult<Option<u32>> {
        let mut state = self.state.lock().await;
        Ok(state.licences.get_mut(&tenant_id).map(|l| {
            l.used_seats = l.used_seats.saturating_sub(1);
            l.updated_at = Utc::now();
            l.used_seats
        }))
    }
}

#[async_trait]
impl LicenceTypeStore for MemoryStore {
    async fn find_by_id(&self, id: LicenceTypeId) -> AppResult<Option<LicenceType>> {
        let state = self.state.lock().await;
        Ok(state.licence_types.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<LicenceType>> {
        let state = self.state.lock().await;
        Ok(state
            .licence_types
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<LicenceType>> {
        let state = self.state.lock().await;
        Ok(state.licence_types.values().cloned().collect())
    }

    async fn create(&self, data: &CreateLicenceType) -> AppResult<LicenceType> {
        if data.max_seats == 0 {
            return Err(AppError::validation("max_seats must be greater than zero"));
        }
        let mut state = self.state.lock().await;
        if state.licence_types.values().any(|t| t.name == data.name) {
            return Err(AppError::conflict(format!(
                "Licence type '{}' already exists",
                data.name
            )));
        }

        let now = Utc::now();
        let id = LicenceTypeId::new(state.next_id());
        let licence_type = LicenceType {
            id,
            name: data.name.clone(),
            description: data.description.clone(),
            max_seats: data.max_seats,
            created_at: now,
            updated_at: now,
        };
        state.licence_types.insert(id, licence_type.clone());
        Ok(licence_type)
    }

    async fn delete(&self, id: LicenceTypeId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if state.licences.values().any(|l| l.licence_type_id == id) {
            return Err(AppError::conflict(format!(
                "Licence type {id} is still assigned to tenants"
            )));
        }
        Ok(state.licence_types.remove(&id).is_some())
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn find_by_id(&self, id: TenantId) -> AppResult<Option<Tenant>> {
        let state = self.state.lock().await;
        Ok(state.tenants.get(&id).cloned())
    }

    async fn find_by_email_domain(&self, domain: &str) -> AppResult<Option<Tenant>> {
        let state = self.state.lock().await;
        let domain = domain.to_ascii_lowercase();
        Ok(state
            .tenants
            .values()
            .find(|t| email_domain(&t.email).as_deref() == Some(domain.as_str()))
            .cloned())
    }

    async fn create(&self, data: &CreateTenant) -> AppResult<Tenant> {
        let domain = email_domain(&data.email).ok_or_else(|| {
            AppError::validation(format!("Tenant email '{}' has no domain", data.email))
        })?;
        let mut state = self.state.lock().await;
        if state
            .tenants
            .values()
            .any(|t| email_domain(&t.email).as_deref() == Some(domain.as_str()))
        {
            return Err(AppError::conflict(format!(
                "A tenant is already registered for '{domain}'"
            )));
        }

        let now = Utc::now();
        let id = TenantId::new(state.next_id());
        let tenant = Tenant {
            id,
            name: data.name.clone(),
            email: data.email.trim().to_string(),
            phone: data.phone.clone(),
            address: data.address.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.tenants.insert(id, tenant.clone());
        Ok(tenant)
    }
}
