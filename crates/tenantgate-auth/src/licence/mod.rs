//! Per-tenant licence accounting.

pub mod ledger;

pub use ledger::{LicenceLedger, SeatReservation};
