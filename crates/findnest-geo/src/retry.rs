//! Retry with exponential back-off and jitter for the API clients.
//!
//! Only search, routing and style fetches go through here. Geocoding is
//! single-shot; the next qualifying address edit is the retry.

use std::future::Future;
use std::time::Duration;

use crate::error::GeoError;

/// Longest sleep between attempts, before jitter.
const BACKOFF_CEILING: Duration = Duration::from_secs(8);

/// Sleep before retry number `attempt` (1-based): `base_ms × 2^(attempt-1)`,
/// clamped to [`BACKOFF_CEILING`], then scaled by `0.75 + jitter / 2` where
/// `jitter` is drawn from `[0, 1)`.
///
/// With the configured default base of 500 ms
/// (`FINDNEST_RETRY_BACKOFF_BASE_MS`) and two retries
/// (`FINDNEST_MAX_RETRIES`), a failing request sleeps roughly 0.5 s and then
/// 1 s. The ceiling is reached from the fifth retry on.
fn backoff_delay(attempt: u32, base_ms: u64, jitter: f64) -> Duration {
    let doublings = attempt.saturating_sub(1).min(16);
    let nominal = Duration::from_millis(base_ms.saturating_mul(1 << doublings));
    nominal.min(BACKOFF_CEILING).mul_f64(0.75 + jitter.clamp(0.0, 1.0) / 2.0)
}

/// Runs `operation`, retrying transient failures up to `max_retries` times
/// with [`backoff_delay`] between attempts. Non-retriable errors are returned
/// immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, GeoError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GeoError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retriable() && retries < max_retries => err,
            Err(err) => return Err(err),
        };
        retries += 1;
        let delay = backoff_delay(retries, backoff_base_ms, rand::random::<f64>());
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient API error, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
