//! User domain entities.

pub mod model;
pub mod role;

pub use model::{CreateUser, LoginAttemptState, User};
pub use role::UserRole;
