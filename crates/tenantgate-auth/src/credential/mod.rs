//! Login credential verification.

pub mod verifier;

pub use verifier::{CredentialVerifier, LoginOutcome};
