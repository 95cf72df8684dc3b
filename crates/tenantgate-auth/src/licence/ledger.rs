//! Licence ledger: seat capacity, expiry, plan changes and renewals.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use tenantgate_core::config::{AuthConfig, LicenceConfig};
use tenantgate_core::types::{LicenceTypeId, TenantId};
use tenantgate_database::store::{LicenceTypeStore, SeatIncrement, TenantLicenceStore};
use tenantgate_entity::licence::{CreateTenantLicence, LicenceSummary, LicenceType, TenantLicence};

use crate::error::AuthError;
use crate::locks::KeyedLocks;
use crate::timeout::bounded;

/// Outcome of a successful seat reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatReservation {
    pub tenant_id: TenantId,
    /// Seats in use after the reservation.
    pub used_seats: u32,
    pub max_seats: u32,
}

/// Enforces `0 <= used_seats <= max_seats` and licence expiry per tenant.
///
/// Every mutation holds the tenant's lock from [`KeyedLocks`] for its whole
/// read-check-write sequence, and the store applies each counter change as a
/// single conditional update.
#[derive(Debug, Clone)]
pub struct LicenceLedger {
    licences: Arc<dyn TenantLicenceStore>,
    licence_types: Arc<dyn LicenceTypeStore>,
    locks: KeyedLocks<TenantId>,
    reservations: Cache<(TenantId, String), SeatReservation>,
    idempotency_window: Duration,
    store_timeout: Duration,
}

impl LicenceLedger {
    pub fn new(
        licences: Arc<dyn TenantLicenceStore>,
        licence_types: Arc<dyn LicenceTypeStore>,
        auth: &AuthConfig,
        config: &LicenceConfig,
    ) -> Self {
        let idempotency_window = Duration::from_secs(config.idempotency_window_seconds);
        let reservations = Cache::builder()
            .max_capacity(config.idempotency_capacity)
            .time_to_live(idempotency_window)
            .build();

        Self {
            licences,
            licence_types,
            locks: KeyedLocks::new(),
            reservations,
            idempotency_window,
            store_timeout: auth.store_timeout(),
        }
    }

    /// Create the licence for a newly registered tenant.
    ///
    /// The licence starts with one used seat (the registering admin), a
    /// random key and no expiry.
    pub async fn issue_licence(
        &self,
        tenant_id: TenantId,
        licence_type_id: LicenceTypeId,
    ) -> Result<TenantLicence, AuthError> {
        let _guard = self.locks.acquire(tenant_id).await;
        self.licence_type(licence_type_id).await?;

        let licence = bounded(
            self.store_timeout,
            "create_tenant_licence",
            self.licences.create(&CreateTenantLicence {
                tenant_id,
                licence_type_id,
                licence_key: Uuid::new_v4().to_string(),
                used_seats: 1,
                expiry_date: None,
            }),
        )
        .await?;

        info!(tenant_id = %tenant_id, licence_type_id = %licence_type_id, "Licence issued");
        Ok(licence)
    }

    /// Reserve one seat at the current time.
    pub async fn reserve_seat(&self, tenant_id: TenantId) -> Result<SeatReservation, AuthError> {
        self.reserve_seat_at(tenant_id, Utc::now()).await
    }

    /// Reserve one seat as if the current time were `now`.
    ///
    /// Returns only after the store has durably incremented the counter.
    pub async fn reserve_seat_at(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<SeatReservation, AuthError> {
        let _guard = self.locks.acquire(tenant_id).await;
        self.reserve_locked(tenant_id, now).await
    }

    /// Reserve one seat at most once per `idempotency_key` within the
    /// configured window. A retry with the same key returns the first
    /// reservation without incrementing again.
    ///
    /// The key is recorded by the store in the same write as the increment,
    /// so a retry after a timed-out attempt that did commit is still
    /// recognised.
    pub async fn reserve_seat_once(
        &self,
        tenant_id: TenantId,
        idempotency_key: &str,
    ) -> Result<SeatReservation, AuthError> {
        let cache_key = (tenant_id, idempotency_key.to_string());
        let _guard = self.locks.acquire(tenant_id).await;

        if let Some(previous) = self.reservations.get(&cache_key).await {
            info!(tenant_id = %tenant_id, "Seat reservation replayed");
            return Ok(previous);
        }

        let licence = self.licence_of(tenant_id).await?;
        if licence.is_expired_at(Utc::now()) {
            warn!(tenant_id = %tenant_id, expiry = ?licence.expiry_date, "Seat refused: licence expired");
            return Err(AuthError::LicenceExpired);
        }
        let max_seats = self.licence_type(licence.licence_type_id).await?.max_seats;

        let outcome = bounded(
            self.store_timeout,
            "increment_used_seats_once",
            self.licences.try_increment_used_seats_once(
                tenant_id,
                max_seats,
                idempotency_key,
                self.idempotency_window,
            ),
        )
        .await?;

        let used_seats = match outcome {
            SeatIncrement::Applied(used) => {
                info!(tenant_id = %tenant_id, used_seats = used, max_seats, "Seat reserved");
                used
            }
            SeatIncrement::Replayed(used) => {
                info!(tenant_id = %tenant_id, used_seats = used, "Seat reservation replayed");
                used
            }
            SeatIncrement::Refused => {
                warn!(tenant_id = %tenant_id, max_seats, "Seat refused: licence full");
                return Err(AuthError::LicenceSeatsExceeded);
            }
        };

        let reservation = SeatReservation {
            tenant_id,
            used_seats,
            max_seats,
        };
        self.reservations.insert(cache_key, reservation).await;
        Ok(reservation)
    }

    /// Give back one seat. The counter never drops below zero.
    pub async fn release_seat(&self, tenant_id: TenantId) -> Result<u32, AuthError> {
        let _guard = self.locks.acquire(tenant_id).await;

        let used = bounded(
            self.store_timeout,
            "decrement_used_seats",
            self.licences.decrement_used_seats(tenant_id),
        )
        .await?
        .ok_or(AuthError::LicenceNotFound)?;

        info!(tenant_id = %tenant_id, used_seats = used, "Seat released");
        Ok(used)
    }

    /// Move a tenant to another plan.
    ///
    /// With `extension_days > 0` the licence expires that many days from now;
    /// otherwise the expiry is cleared. A plan smaller than the seats already
    /// in use is refused with `LicenceSeatsExceeded`.
    pub async fn change_licence_type(
        &self,
        tenant_id: TenantId,
        licence_type_id: LicenceTypeId,
        extension_days: i64,
    ) -> Result<TenantLicence, AuthError> {
        self.change_licence_type_at(tenant_id, licence_type_id, extension_days, Utc::now())
            .await
    }

    pub async fn change_licence_type_at(
        &self,
        tenant_id: TenantId,
        licence_type_id: LicenceTypeId,
        extension_days: i64,
        now: DateTime<Utc>,
    ) -> Result<TenantLicence, AuthError> {
        let _guard = self.locks.acquire(tenant_id).await;

        let mut licence = self.licence_of(tenant_id).await?;
        let licence_type = self.licence_type(licence_type_id).await?;

        if licence.used_seats > licence_type.max_seats {
            warn!(
                tenant_id = %tenant_id,
                used_seats = licence.used_seats,
                max_seats = licence_type.max_seats,
                "Plan change refused: seats in use exceed new plan"
            );
            return Err(AuthError::LicenceSeatsExceeded);
        }

        licence.licence_type_id = licence_type.id;
        licence.expiry_date = if extension_days > 0 {
            Some(days_from(now, extension_days)?)
        } else {
            None
        };

        let saved = bounded(self.store_timeout, "save_tenant_licence", self.licences.save(&licence))
            .await?;

        info!(
            tenant_id = %tenant_id,
            licence_type = %licence_type.name,
            expiry = ?saved.expiry_date,
            "Licence type changed"
        );
        Ok(saved)
    }

    /// Set the expiry to `add_days` days from now.
    ///
    /// Renewal always counts from the current time, not from the previous
    /// expiry.
    pub async fn renew(&self, tenant_id: TenantId, add_days: u32) -> Result<TenantLicence, AuthError> {
        self.renew_at(tenant_id, add_days, Utc::now()).await
    }

    pub async fn renew_at(
        &self,
        tenant_id: TenantId,
        add_days: u32,
        now: DateTime<Utc>,
    ) -> Result<TenantLicence, AuthError> {
        let _guard = self.locks.acquire(tenant_id).await;

        let mut licence = self.licence_of(tenant_id).await?;
        licence.expiry_date = Some(days_from(now, i64::from(add_days))?);

        let saved = bounded(self.store_timeout, "save_tenant_licence", self.licences.save(&licence))
            .await?;

        info!(tenant_id = %tenant_id, expiry = ?saved.expiry_date, "Licence renewed");
        Ok(saved)
    }

    /// Licence joined with its plan.
    pub async fn summary(&self, tenant_id: TenantId) -> Result<LicenceSummary, AuthError> {
        let licence = self.licence_of(tenant_id).await?;
        let licence_type = self.licence_type(licence.licence_type_id).await?;

        Ok(LicenceSummary {
            licence_id: licence.id,
            tenant_id: licence.tenant_id,
            licence_key: licence.licence_key,
            licence_type_name: licence_type.name,
            max_seats: licence_type.max_seats,
            used_seats: licence.used_seats,
            expiry_date: licence.expiry_date,
        })
    }

    /// Reservation body; the caller holds the tenant lock.
    async fn reserve_locked(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<SeatReservation, AuthError> {
        let licence = self.licence_of(tenant_id).await?;

        if licence.is_expired_at(now) {
            warn!(tenant_id = %tenant_id, expiry = ?licence.expiry_date, "Seat refused: licence expired");
            return Err(AuthError::LicenceExpired);
        }

        let max_seats = self.licence_type(licence.licence_type_id).await?.max_seats;
        if licence.used_seats >= max_seats {
            warn!(tenant_id = %tenant_id, max_seats, "Seat refused: licence full");
            return Err(AuthError::LicenceSeatsExceeded);
        }

        let used_seats = bounded(
            self.store_timeout,
            "increment_used_seats",
            self.licences.try_increment_used_seats(tenant_id, max_seats),
        )
        .await?
        .ok_or_else(|| {
            warn!(tenant_id = %tenant_id, max_seats, "Seat refused: licence full");
            AuthError::LicenceSeatsExceeded
        })?;

        info!(tenant_id = %tenant_id, used_seats, max_seats, "Seat reserved");
        Ok(SeatReservation {
            tenant_id,
            used_seats,
            max_seats,
        })
    }

    async fn licence_of(&self, tenant_id: TenantId) -> Result<TenantLicence, AuthError> {
        bounded(
            self.store_timeout,
            "find_tenant_licence",
            self.licences.find_by_tenant_id(tenant_id),
        )
        .await?
        .ok_or(AuthError::LicenceNotFound)
    }

    async fn licence_type(&self, id: LicenceTypeId) -> Result<LicenceType, AuthError> {
        bounded(
            self.store_timeout,
            "find_licence_type",
            self.licence_types.find_by_id(id),
        )
        .await?
        .ok_or(AuthError::LicenceTypeNotFound)
    }
}

fn days_from(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, AuthError> {
    chrono::Duration::try_days(days)
        .and_then(|span| now.checked_add_signed(span))
        .ok_or_else(|| AuthError::InvalidArgument(format!("{days} days is out of range")))
}
