//! Per-client request throttling.

pub mod limiter;

pub use limiter::RateLimiter;
