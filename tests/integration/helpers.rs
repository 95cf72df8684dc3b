//! Shared fixtures for integration tests.
//!
//! Every fixture runs against [`MemoryStore`], which carries the same
//! constraint and atomicity semantics as the PostgreSQL repositories.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tenantgate_auth::{
    CredentialVerifier, JwtDecoder, JwtEncoder, LicenceLedger, LockoutTracker, PasswordHasher,
    RequestGate,
};
use tenantgate_core::config::AppConfig;
use tenantgate_core::result::AppResult;
use tenantgate_core::types::{LicenceTypeId, TenantId, UserId};
use tenantgate_database::repositories::MemoryStore;
use tenantgate_database::{
    LicenceTypeStore, SeatIncrement, TenantLicenceStore, TenantStore, UserStore,
};
use tenantgate_entity::licence::{CreateLicenceType, CreateTenantLicence, LicenceType, TenantLicence};
use tenantgate_entity::user::{CreateUser, LoginAttemptState, User};
use tenantgate_service::{
    NewUserRequest, RegisterTenantRequest, RegistrationService, TenantRegistration,
};

pub const PASSWORD: &str = "correct-horse-battery";
pub const CLIENT_IP: &str = "203.0.113.7";

/// Configuration every fixture starts from.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config
}

/// Fully wired core over one in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub config: AppConfig,
    pub ledger: LicenceLedger,
    pub registration: RegistrationService,
    pub verifier: CredentialVerifier,
    pub decoder: JwtDecoder,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_user_store(config, store.clone(), store)
    }

    /// Wire the core with a custom user store in front of `store`.
    pub fn with_user_store(
        config: AppConfig,
        store: Arc<MemoryStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self::with_stores(config, store.clone(), users, store)
    }

    /// Wire the core with custom user and licence stores in front of `store`.
    pub fn with_stores(
        config: AppConfig,
        store: Arc<MemoryStore>,
        users: Arc<dyn UserStore>,
        licences: Arc<dyn TenantLicenceStore>,
    ) -> Self {
        let licence_types: Arc<dyn LicenceTypeStore> = store.clone();
        let tenants: Arc<dyn TenantStore> = store.clone();

        let ledger = LicenceLedger::new(
            licences,
            licence_types.clone(),
            &config.auth,
            &config.licence,
        );
        let hasher = PasswordHasher::new();
        let registration = RegistrationService::new(
            tenants,
            users.clone(),
            licence_types,
            ledger.clone(),
            hasher.clone(),
            &config.auth,
        );
        let verifier = CredentialVerifier::new(
            users.clone(),
            hasher,
            LockoutTracker::new(users, &config.auth),
            JwtEncoder::new(&config.auth).expect("encoder"),
            &config.auth,
        );
        let decoder = JwtDecoder::new(&config.auth).expect("decoder");

        Self {
            store,
            config,
            ledger,
            registration,
            verifier,
            decoder,
        }
    }

    /// A request gate built from this app's configuration with the given
    /// rate limit.
    pub fn gate(&self, burst: u32, requests_per_second: f64) -> RequestGate {
        let mut config = self.config.clone();
        config.rate_limit.burst = burst;
        config.rate_limit.requests_per_second = requests_per_second;
        RequestGate::from_config(&config, self.decoder.clone()).expect("gate")
    }

    pub async fn create_plan(&self, name: &str, max_seats: u32) -> LicenceType {
        let licence_types: &dyn LicenceTypeStore = self.store.as_ref();
        licence_types
            .create(&CreateLicenceType {
                name: name.to_string(),
                description: format!("{name} plan"),
                max_seats,
            })
            .await
            .expect("create plan")
    }

    /// Register a tenant on `domain` with `admin@{domain}` as its admin.
    pub async fn register_tenant(
        &self,
        domain: &str,
        plan: Option<LicenceTypeId>,
    ) -> TenantRegistration {
        self.registration
            .register_tenant(tenant_request(domain, plan))
            .await
            .expect("register tenant")
    }

    pub async fn add_user(&self, tenant_id: TenantId, email: &str) -> User {
        self.registration
            .register_user(tenant_id, user_request(email))
            .await
            .expect("register user")
    }

    pub async fn user(&self, email: &str) -> Option<User> {
        let users: &dyn UserStore = self.store.as_ref();
        users.find_by_email(email).await.expect("find user")
    }

    pub async fn used_seats(&self, tenant_id: TenantId) -> u32 {
        self.ledger
            .summary(tenant_id)
            .await
            .expect("licence summary")
            .used_seats
    }

    /// Log in with [`PASSWORD`] and return the bearer token.
    pub async fn login(&self, email: &str) -> String {
        self.verifier
            .verify_login(email, PASSWORD, CLIENT_IP)
            .await
            .expect("login")
            .token
    }
}

pub fn user_request(email: &str) -> NewUserRequest {
    NewUserRequest {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
    }
}

pub fn tenant_request(domain: &str, plan: Option<LicenceTypeId>) -> RegisterTenantRequest {
    RegisterTenantRequest {
        name: format!("Tenant {domain}"),
        email: format!("contact@{domain}"),
        phone: "+1 555 0100".to_string(),
        address: "1 Main Street".to_string(),
        licence_type_id: plan,
        admin: user_request(&format!("admin@{domain}")),
    }
}

/// User store whose email lookups stall for `delay` before answering.
#[derive(Debug)]
pub struct SlowUserStore {
    pub inner: Arc<MemoryStore>,
    pub delay: Duration,
}

#[async_trait]
impl UserStore for SlowUserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        tokio::time::sleep(self.delay).await;
        UserStore::find_by_email(self.inner.as_ref(), email).await
    }

    async fn find_by_id(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<User>> {
        UserStore::find_by_id(self.inner.as_ref(), tenant_id, user_id).await
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        UserStore::create(self.inner.as_ref(), data).await
    }

    async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        UserStore::delete(self.inner.as_ref(), tenant_id, user_id).await
    }

    async fn record_failed_login(
        &self,
        user_id: UserId,
        threshold: u32,
    ) -> AppResult<LoginAttemptState> {
        self.inner.record_failed_login(user_id, threshold).await
    }

    async fn record_successful_login(
        &self,
        user_id: UserId,
        ip: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LoginAttemptState>> {
        self.inner.record_successful_login(user_id, ip, now).await
    }
}

/// User store whose inserts commit and then stall for `delay`, so the
/// caller times out on a write that did happen.
#[derive(Debug)]
pub struct StallAfterCreateUserStore {
    pub inner: Arc<MemoryStore>,
    pub delay: Duration,
}

#[async_trait]
impl UserStore for StallAfterCreateUserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        UserStore::find_by_email(self.inner.as_ref(), email).await
    }

    async fn find_by_id(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<User>> {
        UserStore::find_by_id(self.inner.as_ref(), tenant_id, user_id).await
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let user = UserStore::create(self.inner.as_ref(), data).await?;
        tokio::time::sleep(self.delay).await;
        Ok(user)
    }

    async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        UserStore::delete(self.inner.as_ref(), tenant_id, user_id).await
    }

    async fn record_failed_login(
        &self,
        user_id: UserId,
        threshold: u32,
    ) -> AppResult<LoginAttemptState> {
        self.inner.record_failed_login(user_id, threshold).await
    }

    async fn record_successful_login(
        &self,
        user_id: UserId,
        ip: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LoginAttemptState>> {
        self.inner.record_successful_login(user_id, ip, now).await
    }
}

/// Licence store whose first keyed increment commits and then stalls for
/// `delay`. Later calls answer immediately.
#[derive(Debug)]
pub struct StallOnceLicenceStore {
    pub inner: Arc<MemoryStore>,
    pub delay: Duration,
    pub stalled: AtomicBool,
}

impl StallOnceLicenceStore {
    pub fn new(inner: Arc<MemoryStore>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            stalled: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl TenantLicenceStore for StallOnceLicenceStore {
    async fn find_by_tenant_id(&self, tenant_id: TenantId) -> AppResult<Option<TenantLicence>> {
        TenantLicenceStore::find_by_tenant_id(self.inner.as_ref(), tenant_id).await
    }

    async fn create(&self, data: &CreateTenantLicence) -> AppResult<TenantLicence> {
        TenantLicenceStore::create(self.inner.as_ref(), data).await
    }

    async fn save(&self, licence: &TenantLicence) -> AppResult<TenantLicence> {
        TenantLicenceStore::save(self.inner.as_ref(), licence).await
    }

    async fn try_increment_used_seats(
        &self,
        tenant_id: TenantId,
        max_seats: u32,
    ) -> AppResult<Option<u32>> {
        self.inner.try_increment_used_seats(tenant_id, max_seats).await
    }

    async fn try_increment_used_seats_once(
        &self,
        tenant_id: TenantId,
        max_seats: u32,
        idempotency_key: &str,
        window: Duration,
    ) -> AppResult<SeatIncrement> {
        let outcome = self
            .inner
            .try_increment_used_seats_once(tenant_id, max_seats, idempotency_key, window)
            .await?;
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        Ok(outcome)
    }

    async fn decrement_used_seats(&self, tenant_id: TenantId) -> AppResult<Option<u32>> {
        self.inner.decrement_used_seats(tenant_id).await
    }
}
