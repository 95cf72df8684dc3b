//! Deadline enforcement for store calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use tenantgate_core::error::AppError;
use tenantgate_core::result::AppResult;

/// Await a store call, failing with a retryable `Timeout` error once `limit`
/// elapses. A timed-out call is never reported as success or as a domain
/// rejection.
pub async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "Store call timed out");
            Err(AppError::timeout(format!(
                "{operation} did not complete within {}ms",
                limit.as_millis()
            )))
        }
    }
}
