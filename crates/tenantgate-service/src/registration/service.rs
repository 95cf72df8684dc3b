//! Registration workflows.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};
use validator::Validate;

use tenantgate_auth::licence::LicenceLedger;
use tenantgate_auth::password::PasswordHasher;
use tenantgate_auth::timeout::bounded;
use tenantgate_auth::AuthError;
use tenantgate_core::config::AuthConfig;
use tenantgate_core::error::{AppError, ErrorKind};
use tenantgate_core::types::{TenantId, UserId};
use tenantgate_database::store::{LicenceTypeStore, TenantStore, UserStore};
use tenantgate_entity::licence::licence_type::FREE_LICENCE_TYPE;
use tenantgate_entity::licence::{LicenceType, TenantLicence};
use tenantgate_entity::tenant::{CreateTenant, Tenant, email_domain};
use tenantgate_entity::user::{CreateUser, User, UserRole};

use super::error::RegistrationError;
use super::request::{NewUserRequest, RegisterTenantRequest};

/// Everything created by a tenant sign-up.
#[derive(Debug, Clone, Serialize)]
pub struct TenantRegistration {
    pub tenant: Tenant,
    pub licence: TenantLicence,
    pub admin: User,
}

/// Creates tenants and users while keeping the seat ledger consistent.
#[derive(Debug, Clone)]
pub struct RegistrationService {
    tenants: Arc<dyn TenantStore>,
    users: Arc<dyn UserStore>,
    licence_types: Arc<dyn LicenceTypeStore>,
    ledger: LicenceLedger,
    hasher: PasswordHasher,
    store_timeout: Duration,
}

impl RegistrationService {
    pub fn new(
        tenants: Arc<dyn TenantStore>,
        users: Arc<dyn UserStore>,
        licence_types: Arc<dyn LicenceTypeStore>,
        ledger: LicenceLedger,
        hasher: PasswordHasher,
        config: &AuthConfig,
    ) -> Self {
        Self {
            tenants,
            users,
            licence_types,
            ledger,
            hasher,
            store_timeout: config.store_timeout(),
        }
    }

    /// Register a tenant, its licence and its `tenant_admin` user.
    ///
    /// The admin occupies the licence's first seat.
    pub async fn register_tenant(
        &self,
        req: RegisterTenantRequest,
    ) -> Result<TenantRegistration, RegistrationError> {
        req.validate()?;

        let domain = email_domain(&req.email)
            .ok_or_else(|| AppError::validation("Tenant email has no domain"))?;
        let existing = bounded(
            self.store_timeout,
            "find_tenant_by_domain",
            self.tenants.find_by_email_domain(&domain),
        )
        .await?;
        if existing.is_some() {
            warn!(domain = %domain, "Registration refused: tenant already exists");
            return Err(RegistrationError::TenantAlreadyExists);
        }
        self.ensure_email_free(&req.admin.email).await?;

        let licence_type = self.starting_plan(&req).await?;
        let password_hash = self.hasher.hash_password(&req.admin.password)?;

        let tenant = bounded(
            self.store_timeout,
            "create_tenant",
            self.tenants.create(&CreateTenant {
                name: req.name.trim().to_string(),
                email: req.email.trim().to_string(),
                phone: req.phone.clone(),
                address: req.address.clone(),
            }),
        )
        .await
        .map_err(|e| on_conflict(e, RegistrationError::TenantAlreadyExists))?;

        let licence = self.ledger.issue_licence(tenant.id, licence_type.id).await?;
        let admin = self
            .create_user(tenant.id, &req.admin, password_hash, UserRole::TenantAdmin)
            .await?;

        info!(
            tenant_id = %tenant.id,
            admin_id = %admin.id,
            licence_type = %licence_type.name,
            "Tenant registered"
        );

        Ok(TenantRegistration {
            tenant,
            licence,
            admin,
        })
    }

    /// Add a `tenant_user` to a tenant, consuming one seat.
    ///
    /// The seat is handed back if the user definitely was not created. After
    /// a store timeout the seat stays reserved, since the user may exist.
    pub async fn register_user(
        &self,
        tenant_id: TenantId,
        req: NewUserRequest,
    ) -> Result<User, RegistrationError> {
        req.validate()?;
        self.ensure_email_free(&req.email).await?;

        let password_hash = self.hasher.hash_password(&req.password)?;
        let reservation = self.ledger.reserve_seat(tenant_id).await?;

        match self
            .create_user(tenant_id, &req, password_hash, UserRole::TenantUser)
            .await
        {
            Ok(user) => {
                info!(
                    tenant_id = %tenant_id,
                    user_id = %user.id,
                    used_seats = reservation.used_seats,
                    max_seats = reservation.max_seats,
                    "User registered"
                );
                Ok(user)
            }
            Err(err) if err.is_retryable() => {
                // A timed-out insert may still have committed; releasing
                // here could leave more users than seats.
                warn!(
                    tenant_id = %tenant_id,
                    error = %err,
                    "User creation outcome unknown; seat kept reserved"
                );
                Err(err)
            }
            Err(err) => {
                if let Err(release_err) = self.ledger.release_seat(tenant_id).await {
                    error!(
                        tenant_id = %tenant_id,
                        error = %release_err,
                        "Failed to release seat after user creation failed"
                    );
                }
                Err(err)
            }
        }
    }

    /// Remove a user and free its seat.
    pub async fn delete_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<(), RegistrationError> {
        let user = bounded(
            self.store_timeout,
            "find_user_by_id",
            self.users.find_by_id(tenant_id, user_id),
        )
        .await?;
        if user.is_none() {
            return Err(RegistrationError::UserNotFound);
        }

        let deleted = bounded(
            self.store_timeout,
            "delete_user",
            self.users.delete(tenant_id, user_id),
        )
        .await?;
        if !deleted {
            return Err(RegistrationError::UserNotFound);
        }

        let used_seats = self.ledger.release_seat(tenant_id).await?;
        info!(tenant_id = %tenant_id, user_id = %user_id, used_seats, "User deleted");
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), RegistrationError> {
        let existing = bounded(
            self.store_timeout,
            "find_user_by_email",
            self.users.find_by_email(email),
        )
        .await?;
        match existing {
            Some(_) => Err(RegistrationError::UserAlreadyExists),
            None => Ok(()),
        }
    }

    async fn starting_plan(&self, req: &RegisterTenantRequest) -> Result<LicenceType, RegistrationError> {
        let plan = match req.licence_type_id {
            Some(id) => {
                bounded(self.store_timeout, "find_licence_type", self.licence_types.find_by_id(id))
                    .await?
            }
            None => {
                bounded(
                    self.store_timeout,
                    "find_licence_type_by_name",
                    self.licence_types.find_by_name(FREE_LICENCE_TYPE),
                )
                .await?
            }
        };
        plan.ok_or(RegistrationError::Auth(AuthError::LicenceTypeNotFound))
    }

    async fn create_user(
        &self,
        tenant_id: TenantId,
        req: &NewUserRequest,
        password_hash: String,
        role: UserRole,
    ) -> Result<User, RegistrationError> {
        bounded(
            self.store_timeout,
            "create_user",
            self.users.create(&CreateUser {
                tenant_id,
                first_name: req.first_name.trim().to_string(),
                last_name: req.last_name.trim().to_string(),
                email: req.email.trim().to_string(),
                password_hash,
                role,
            }),
        )
        .await
        .map_err(|e| on_conflict(e, RegistrationError::UserAlreadyExists))
    }
}

/// Store conflicts lost to a concurrent registration become `domain`.
fn on_conflict(err: AppError, domain: RegistrationError) -> RegistrationError {
    if err.kind == ErrorKind::Conflict {
        domain
    } else {
        RegistrationError::Store(err)
    }
}
