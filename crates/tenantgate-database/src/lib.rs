//! # tenantgate-database
//!
//! Store contracts consumed by the enforcement core, their PostgreSQL
//! implementations, and an in-memory implementation with the same
//! semantics for tests and local runs.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{LicenceTypeStore, SeatIncrement, TenantLicenceStore, TenantStore, UserStore};
