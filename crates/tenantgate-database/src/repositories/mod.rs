//! Store implementations: PostgreSQL repositories and the in-memory store.

pub mod licence;
pub mod licence_type;
pub mod memory;
pub mod tenant;
pub mod user;

pub use licence::TenantLicenceRepository;
pub use licence_type::LicenceTypeRepository;
pub use memory::MemoryStore;
pub use tenant::TenantRepository;
pub use user::UserRepository;

/// PostgreSQL SQLSTATE for a foreign-key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Identifiers are BIGSERIAL on the database side.
fn db_id(id: u64) -> i64 {
    id as i64
}

/// Counters are non-negative INTEGER columns guarded by CHECK constraints.
fn db_count(value: i32) -> u32 {
    value.max(0) as u32
}

/// Bind a `u32` limit against an INTEGER column, saturating.
fn db_limit(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Whether an sqlx error is a violation of the named constraint.
fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint))
}

/// Whether an sqlx error is a foreign-key violation.
fn violates_foreign_key(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION))
}
