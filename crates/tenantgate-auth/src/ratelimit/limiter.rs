//! Token bucket rate limiter keyed by client identity.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use tenantgate_core::config::RateLimitConfig;

#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Tokens available at `now`, without mutating the bucket.
    fn available_at(&self, now: Instant, rate: f64, capacity: f64) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        (self.tokens + elapsed * rate).min(capacity)
    }
}

/// In-memory token buckets, one per client key.
///
/// Each bucket holds at most `burst` tokens and refills continuously at
/// `requests_per_second`. Unseen keys start full. Buckets are sharded in a
/// [`DashMap`], so admission for one key only contends with that key's shard.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, TokenBucket>>,
    capacity: f64,
    refill_rate: f64,
}

impl RateLimiter {
    pub fn new(burst: u32, requests_per_second: f64) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            capacity: f64::from(burst),
            refill_rate: requests_per_second,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.burst, config.requests_per_second)
    }

    /// Try to spend one token for `key` now.
    pub fn admit(&self, key: &str) -> bool {
        self.admit_at(key, Instant::now())
    }

    /// Try to spend one token for `key` at `now`.
    ///
    /// A denied request leaves the bucket untouched.
    pub fn admit_at(&self, key: &str, now: Instant) -> bool {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket {
                tokens: self.capacity,
                last_refill: now,
            });

        let available = bucket.available_at(now, self.refill_rate, self.capacity);
        if available < 1.0 {
            return false;
        }
        bucket.tokens = available - 1.0;
        bucket.last_refill = now.max(bucket.last_refill);
        true
    }

    /// Drop buckets idle for at least `max_idle` that have refilled completely.
    ///
    /// Such a bucket is indistinguishable from a fresh one, so evicting it
    /// never changes an admission decision. Returns the number removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        self.evict_idle_at(Instant::now(), max_idle)
    }

    pub fn evict_idle_at(&self, now: Instant, max_idle: Duration) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| {
            let idle = now.saturating_duration_since(bucket.last_refill);
            let full = bucket.available_at(now, self.refill_rate, self.capacity) >= self.capacity;
            !(idle >= max_idle && full)
        });
        before.saturating_sub(self.buckets.len())
    }

    /// Number of tracked client keys.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    /// Run [`evict_idle`](Self::evict_idle) every `every` on the current
    /// tokio runtime until the handle is aborted.
    pub fn spawn_eviction(&self, every: Duration, max_idle: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = limiter.evict_idle(max_idle);
                if evicted > 0 {
                    debug!(evicted, remaining = limiter.tracked_keys(), "Evicted idle rate-limit buckets");
                }
            }
        })
    }
}
