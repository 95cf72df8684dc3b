//! Request rate-limit configuration.

use serde::{Deserialize, Serialize};

/// Token-bucket parameters applied per client key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Continuous refill rate in tokens per second.
    #[serde(default = "default_rps")]
    pub requests_per_second: f64,
    /// Bucket capacity (maximum burst).
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Buckets idle for longer than this are evicted.
    #[serde(default = "default_idle_eviction")]
    pub idle_eviction_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            burst: default_burst(),
            idle_eviction_seconds: default_idle_eviction(),
        }
    }
}

fn default_rps() -> f64 {
    5.0
}

fn default_burst() -> u32 {
    10
}

fn default_idle_eviction() -> u64 {
    600
}
