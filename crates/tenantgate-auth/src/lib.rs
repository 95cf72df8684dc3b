//! # tenantgate-auth
//!
//! Authentication and tenant-licence enforcement.
//!
//! ## Modules
//!
//! - `jwt`: HS256 session token issuance and verification
//! - `password`: Argon2id password hashing
//! - `lockout`: failed-login counting and account locking
//! - `credential`: login verification composing the above
//! - `licence`: per-tenant seat accounting and plan changes
//! - `rbac`: operation-level role checks
//! - `ratelimit`: per-client token buckets
//! - `gate`: request admission: rate limit, bearer token, authorization

pub mod credential;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod licence;
pub mod lockout;
pub mod locks;
pub mod password;
pub mod ratelimit;
pub mod rbac;
pub mod timeout;

pub use credential::{CredentialVerifier, LoginOutcome};
pub use error::AuthError;
pub use gate::RequestGate;
pub use jwt::{Identity, IssuedToken, JwtDecoder, JwtEncoder, SessionClaims};
pub use licence::{LicenceLedger, SeatReservation};
pub use lockout::LockoutTracker;
pub use password::PasswordHasher;
pub use ratelimit::RateLimiter;
pub use rbac::{AuthorizationGuard, AuthorizationPolicies, Operation};
