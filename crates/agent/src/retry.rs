//! Bounded retry with exponential backoff for outbound cloud calls.
//!
//! The handler owns these in-call retries; the queue separately owns
//! message-level retries. Keeping the two apart avoids multiplicative
//! backoff.

use std::future::Future;
use std::time::Duration;

/// Run `op` up to `max_retries` times, sleeping `base * 2^attempt` between
/// attempts. Returns the last error once the budget is spent.
pub(crate) async fn with_backoff<T, E, F, Fut>(
    max_retries: u32,
    base: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_retries = max_retries.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= max_retries {
                    return Err(err);
                }
                let delay = base * 2u32.saturating_pow(attempt - 1);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_backoff(3, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_budget_spent() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = with_backoff(3, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("still down") }
        })
        .await;
        assert_eq!(result.unwrap_err(), "still down");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn recovers_midway() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_backoff(3, Duration::ZERO, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 1 { Err("transient") } else { Ok(n) } }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
