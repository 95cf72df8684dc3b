//! PostgreSQL tenant licence repository.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tenantgate_core::error::{AppError, ErrorKind};
use tenantgate_core::result::AppResult;
use tenantgate_core::types::{LicenceTypeId, TenantId, TenantLicenceId};
use tenantgate_entity::licence::{CreateTenantLicence, TenantLicence};

use super::{db_count, db_id, db_limit, violates, violates_foreign_key};
use crate::store::{SeatIncrement, TenantLicenceStore};

const LICENCE_COLUMNS: &str =
    "id, tenant_id, licence_type_id, licence_key, used_seats, expiry_date, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct LicenceRow {
    id: i64,
    tenant_id: i64,
    licence_type_id: i64,
    licence_key: String,
    used_seats: i32,
    expiry_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LicenceRow> for TenantLicence {
    fn from(row: LicenceRow) -> Self {
        Self {
            id: TenantLicenceId::new(row.id as u64),
            tenant_id: TenantId::new(row.tenant_id as u64),
            licence_type_id: LicenceTypeId::new(row.licence_type_id as u64),
            licence_key: row.licence_key,
            used_seats: db_count(row.used_seats),
            expiry_date: row.expiry_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Tenant licence store backed by the `tenant_licences` table.
///
/// Seat counters move only through single conditional UPDATE statements, so
/// concurrent reservations from several processes cannot overshoot the cap.
#[derive(Debug, Clone)]
pub struct TenantLicenceRepository {
    pool: PgPool,
}

impl TenantLicenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantLicenceStore for TenantLicenceRepository {
    async fn find_by_tenant_id(&self, tenant_id: TenantId) -> AppResult<Option<TenantLicence>> {
        sqlx::query_as::<_, LicenceRow>(&format!(
            "SELECT {LICENCE_COLUMNS} FROM tenant_licences WHERE tenant_id = $1"
        ))
        .bind(db_id(tenant_id.get()))
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(TenantLicence::from))
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tenant licence", e))
    }

    async fn create(&self, data: &CreateTenantLicence) -> AppResult<TenantLicence> {
        sqlx::query_as::<_, LicenceRow>(&format!(
            "INSERT INTO tenant_licences (tenant_id, licence_type_id, licence_key, used_seats, expiry_date) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {LICENCE_COLUMNS}"
        ))
        .bind(db_id(data.tenant_id.get()))
        .bind(db_id(data.licence_type_id.get()))
        .bind(&data.licence_key)
        .bind(db_limit(data.used_seats))
        .bind(data.expiry_date)
        .fetch_one(&self.pool)
        .await
        .map(TenantLicence::from)
        .map_err(|e| {
            if violates(&e, "tenant_licences_tenant_id_key") {
                AppError::conflict(format!("Tenant {} already has a licence", data.tenant_id))
            } else if violates(&e, "tenant_licences_licence_key_key") {
                AppError::conflict("Licence key already in use")
            } else if violates_foreign_key(&e) {
                AppError::not_found("Tenant or licence type does not exist")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create tenant licence", e)
            }
        })
    }

    async fn save(&self, licence: &TenantLicence) -> AppResult<TenantLicence> {
        sqlx::query_as::<_, LicenceRow>(&format!(
            "UPDATE tenant_licences SET licence_type_id = $2, expiry_date = $3, updated_at = NOW() \
             WHERE tenant_id = $1 RETURNING {LICENCE_COLUMNS}"
        ))
        .bind(db_id(licence.tenant_id.get()))
        .bind(db_id(licence.licence_type_id.get()))
        .bind(licence.expiry_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if violates_foreign_key(&e) {
                AppError::not_found(format!("Licence type {} not found", licence.licence_type_id))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to save tenant licence", e)
            }
        })?
        .map(TenantLicence::from)
        .ok_or_else(|| {
            AppError::not_found(format!("Tenant {} has no licence", licence.tenant_id))
        })
    }

    async fn try_increment_used_seats(
        &self,
        tenant_id: TenantId,
        max_seats: u32,
    ) -> AppResult<Option<u32>> {
        let seats: Option<i32> = sqlx::query_scalar(
            "UPDATE tenant_licences SET used_seats = used_seats + 1, updated_at = NOW() \
             WHERE tenant_id = $1 AND used_seats < $2 RETURNING used_seats",
        )
        .bind(db_id(tenant_id.get()))
        .bind(db_limit(max_seats))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to increment seats", e))?;

        Ok(seats.map(db_count))
    }

    async fn try_increment_used_seats_once(
        &self,
        tenant_id: TenantId,
        max_seats: u32,
        idempotency_key: &str,
        window: Duration,
    ) -> AppResult<SeatIncrement> {
        let db_err =
            |e: sqlx::Error| AppError::with_source(ErrorKind::Database, "Failed to reserve keyed seat", e);
        let tenant = db_id(tenant_id.get());

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Row lock on the licence serialises keyed reservations per tenant
        // across processes.
        let locked: Option<i32> = sqlx::query_scalar(
            "SELECT used_seats FROM tenant_licences WHERE tenant_id = $1 FOR UPDATE",
        )
        .bind(tenant)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        if locked.is_none() {
            tx.rollback().await.map_err(db_err)?;
            return Ok(SeatIncrement::Refused);
        }

        sqlx::query(
            "DELETE FROM seat_reservations \
             WHERE tenant_id = $1 AND idempotency_key = $2 \
               AND created_at <= NOW() - make_interval(secs => $3)",
        )
        .bind(tenant)
        .bind(idempotency_key)
        .bind(window.as_secs_f64())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let previous: Option<i32> = sqlx::query_scalar(
            "SELECT used_seats FROM seat_reservations WHERE tenant_id = $1 AND idempotency_key = $2",
        )
        .bind(tenant)
        .bind(idempotency_key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        if let Some(seats) = previous {
            tx.commit().await.map_err(db_err)?;
            return Ok(SeatIncrement::Replayed(db_count(seats)));
        }

        let bumped: Option<i32> = sqlx::query_scalar(
            "UPDATE tenant_licences SET used_seats = used_seats + 1, updated_at = NOW() \
             WHERE tenant_id = $1 AND used_seats < $2 RETURNING used_seats",
        )
        .bind(tenant)
        .bind(db_limit(max_seats))
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        let Some(seats) = bumped else {
            tx.rollback().await.map_err(db_err)?;
            return Ok(SeatIncrement::Refused);
        };

        sqlx::query(
            "INSERT INTO seat_reservations (tenant_id, idempotency_key, used_seats) VALUES ($1, $2, $3)",
        )
        .bind(tenant)
        .bind(idempotency_key)
        .bind(seats)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(SeatIncrement::Applied(db_count(seats)))
    }

    async fn decrement_used_seats(&self, tenant_id: TenantId) -> AppResult<Option<u32>> {
        let seats: Option<i32> = sqlx::query_scalar(
            "UPDATE tenant_licences SET used_seats = GREATEST(used_seats - 1, 0), updated_at = NOW() \
             WHERE tenant_id = $1 RETURNING used_seats",
        )
        .bind(db_id(tenant_id.get()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to decrement seats", e))?;

        Ok(seats.map(db_count))
    }
}
