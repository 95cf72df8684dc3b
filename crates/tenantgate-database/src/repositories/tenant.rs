//! PostgreSQL tenant repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tenantgate_core::error::{AppError, ErrorKind};
use tenantgate_core::result::AppResult;
use tenantgate_core::types::TenantId;
use tenantgate_entity::tenant::{CreateTenant, Tenant, email_domain};

use super::{db_id, violates};
use crate::store::TenantStore;

const TENANT_COLUMNS: &str = "id, name, email, phone, address, is_active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    id: i64,
    name: String,
    email: String,
    phone: String,
    address: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Self {
            id: TenantId::new(row.id as u64),
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Tenant store backed by the `tenants` table.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore for TenantRepository {
    async fn find_by_id(&self, id: TenantId) -> AppResult<Option<Tenant>> {
        sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"
        ))
        .bind(db_id(id.get()))
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Tenant::from))
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tenant", e))
    }

    async fn find_by_email_domain(&self, domain: &str) -> AppResult<Option<Tenant>> {
        sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE email_domain = LOWER($1)"
        ))
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Tenant::from))
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find tenant by domain", e)
        })
    }

    async fn create(&self, data: &CreateTenant) -> AppResult<Tenant> {
        let domain = email_domain(&data.email).ok_or_else(|| {
            AppError::validation(format!("Tenant email '{}' has no domain", data.email))
        })?;

        sqlx::query_as::<_, TenantRow>(&format!(
            "INSERT INTO tenants (name, email, email_domain, phone, address) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {TENANT_COLUMNS}"
        ))
        .bind(&data.name)
        .bind(data.email.trim())
        .bind(&domain)
        .bind(&data.phone)
        .bind(&data.address)
        .fetch_one(&self.pool)
        .await
        .map(Tenant::from)
        .map_err(|e| {
            if violates(&e, "tenants_email_domain_key") {
                AppError::conflict(format!("A tenant is already registered for '{domain}'"))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create tenant", e)
            }
        })
    }
}
