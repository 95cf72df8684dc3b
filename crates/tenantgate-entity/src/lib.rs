//! # tenantgate-entity
//!
//! Domain entity models for tenantgate. Every struct in this crate is a
//! stored record or a value object handed between the stores and the
//! enforcement core. All entities derive `Debug`, `Clone`, `Serialize`
//! and `Deserialize`.

pub mod licence;
pub mod tenant;
pub mod user;
