//! Operation-level authorization.

pub mod enforcer;
pub mod operation;
pub mod policies;

pub use enforcer::AuthorizationGuard;
pub use operation::Operation;
pub use policies::AuthorizationPolicies;
