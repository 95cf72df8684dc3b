//! # tenantgate-core
//!
//! Core crate for tenantgate. Contains configuration schemas, typed
//! identifiers, and the unified infrastructure error.
//!
//! This crate has **no** internal dependencies on other tenantgate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
