//! PostgreSQL licence type repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tenantgate_core::error::{AppError, ErrorKind};
use tenantgate_core::result::AppResult;
use tenantgate_core::types::LicenceTypeId;
use tenantgate_entity::licence::{CreateLicenceType, LicenceType};

use super::{db_count, db_id, db_limit, violates, violates_foreign_key};
use crate::store::LicenceTypeStore;

const TYPE_COLUMNS: &str = "id, name, description, max_seats, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct LicenceTypeRow {
    id: i64,
    name: String,
    description: String,
    max_seats: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LicenceTypeRow> for LicenceType {
    fn from(row: LicenceTypeRow) -> Self {
        Self {
            id: LicenceTypeId::new(row.id as u64),
            name: row.name,
            description: row.description,
            max_seats: db_count(row.max_seats),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Licence type store backed by the `licence_types` table.
#[derive(Debug, Clone)]
pub struct LicenceTypeRepository {
    pool: PgPool,
}

impl LicenceTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LicenceTypeStore for LicenceTypeRepository {
    async fn find_by_id(&self, id: LicenceTypeId) -> AppResult<Option<LicenceType>> {
        sqlx::query_as::<_, LicenceTypeRow>(&format!(
            "SELECT {TYPE_COLUMNS} FROM licence_types WHERE id = $1"
        ))
        .bind(db_id(id.get()))
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(LicenceType::from))
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find licence type", e))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<LicenceType>> {
        sqlx::query_as::<_, LicenceTypeRow>(&format!(
            "SELECT {TYPE_COLUMNS} FROM licence_types WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(LicenceType::from))
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find licence type by name", e)
        })
    }

    async fn list(&self) -> AppResult<Vec<LicenceType>> {
        sqlx::query_as::<_, LicenceTypeRow>(&format!(
            "SELECT {TYPE_COLUMNS} FROM licence_types ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(LicenceType::from).collect())
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list licence types", e))
    }

    async fn create(&self, data: &CreateLicenceType) -> AppResult<LicenceType> {
        if data.max_seats == 0 {
            return Err(AppError::validation("max_seats must be greater than zero"));
        }
        sqlx::query_as::<_, LicenceTypeRow>(&format!(
            "INSERT INTO licence_types (name, description, max_seats) VALUES ($1, $2, $3) \
             RETURNING {TYPE_COLUMNS}"
        ))
        .bind(&data.name)
        .bind(&data.description)
        .bind(db_limit(data.max_seats))
        .fetch_one(&self.pool)
        .await
        .map(LicenceType::from)
        .map_err(|e| {
            if violates(&e, "licence_types_name_key") {
                AppError::conflict(format!("Licence type '{}' already exists", data.name))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create licence type", e)
            }
        })
    }

    async fn delete(&self, id: LicenceTypeId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM licence_types WHERE id = $1")
            .bind(db_id(id.get()))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if violates_foreign_key(&e) {
                    AppError::conflict(format!("Licence type {id} is still assigned to tenants"))
                } else {
                    AppError::with_source(ErrorKind::Database, "Failed to delete licence type", e)
                }
            })?;

        Ok(result.rows_affected() > 0)
    }
}
