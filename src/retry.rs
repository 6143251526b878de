use std::future::Future;
use std::time::Duration;

/// Run `op` up to `attempts` times with a fixed `delay` between tries.
/// Returns the first success, or the last error once attempts run out.
/// Meant for transient filesystem contention, not network backoff.
pub async fn with_retries<T, E, F, Fut>(attempts: u32, delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_err = Some(err);
                if attempt < attempts {
                    tracing::debug!(attempt, "attempt failed; retrying after delay");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(last_err.expect("attempts >= 1"))
}
