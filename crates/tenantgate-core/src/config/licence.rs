//! Licence ledger configuration.

use serde::{Deserialize, Serialize};

/// Licence ledger tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenceConfig {
    /// How long a completed seat reservation is remembered by its idempotency key.
    #[serde(default = "default_idempotency_window")]
    pub idempotency_window_seconds: u64,
    /// Upper bound on remembered idempotency keys.
    #[serde(default = "default_idempotency_capacity")]
    pub idempotency_capacity: u64,
}

impl Default for LicenceConfig {
    fn default() -> Self {
        Self {
            idempotency_window_seconds: default_idempotency_window(),
            idempotency_capacity: default_idempotency_capacity(),
        }
    }
}

fn default_idempotency_window() -> u64 {
    900
}

fn default_idempotency_capacity() -> u64 {
    100_000
}
