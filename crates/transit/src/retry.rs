//! Bounded exponential-backoff retry policy for remote KMS calls.
//!
//! Only failures classified transient by [`TransitError::is_retryable`]
//! (transport failures and KMS-side 5xx errors) are retried; everything
//! else propagates immediately with zero delay. The delay before retry `i`
//! is `min(base * 2^i, max_wait)`.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use common::TransitError;

/// Number of retries used when the configured attempt count is zero.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;

/// Default base delay between retries.
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(50);

/// Default ceiling for a single backoff delay.
pub const DEFAULT_RETRY_MAX_WAIT: Duration = Duration::from_secs(2);

/// Parameters of the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Maximum number of retries after the initial attempt. A value of `N`
    /// allows `N + 1` total tries.
    pub attempts: u32,
    /// Base delay, doubled on each successive retry.
    pub base: Duration,
    /// Ceiling on any single delay.
    pub max_wait: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            base: DEFAULT_RETRY_BASE,
            max_wait: DEFAULT_RETRY_MAX_WAIT,
        }
    }
}

impl RetrySettings {
    /// Delay before retry `retry` (0-based): `min(base * 2^retry, max_wait)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(retry))
            .min(self.max_wait)
    }
}

/// Run `op`, retrying transient failures with exponential backoff.
///
/// `op` is invoked once, then up to `settings.attempts` more times if each
/// failure is retryable. Before each retry a diagnostic is emitted carrying
/// the attempt index and the triggering error; the extra attempts never
/// change the eventual outcome beyond delaying it. The last error is
/// surfaced once attempts are exhausted.
pub async fn with_retries<T, F, Fut>(settings: RetrySettings, mut op: F) -> Result<T, TransitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransitError>>,
{
    let mut retry = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && retry < settings.attempts => {
                let delay = settings.backoff(retry);
                warn!(
                    attempt = retry,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "an error occurred when trying to communicate with the KMS; retrying"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> RetrySettings {
        RetrySettings {
            attempts: 3,
            base: Duration::from_millis(1),
            max_wait: Duration::from_millis(4),
        }
    }

    fn unavailable() -> TransitError {
        TransitError::RemoteUnavailable("connection refused".into())
    }

    #[test]
    fn backoff_doubles_up_to_max_wait() {
        let settings = RetrySettings {
            attempts: 5,
            base: Duration::from_millis(50),
            max_wait: Duration::from_millis(300),
        };
        assert_eq!(settings.backoff(0), Duration::from_millis(50));
        assert_eq!(settings.backoff(1), Duration::from_millis(100));
        assert_eq!(settings.backoff(2), Duration::from_millis(200));
        assert_eq!(settings.backoff(3), Duration::from_millis(300));
        assert_eq!(settings.backoff(4), Duration::from_millis(300));
        assert_eq!(settings.backoff(30), Duration::from_millis(300));
    }

    #[test]
    fn backoff_is_non_decreasing() {
        let settings = RetrySettings::default();
        let mut previous = Duration::ZERO;
        for retry in 0..16 {
            let delay = settings.backoff(retry);
            assert!(delay >= previous);
            assert!(delay <= settings.max_wait);
            previous = delay;
        }
    }

    #[tokio::test]
    async fn success_on_first_try_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = with_retries(fast(), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(42u32)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_performs_exactly_n_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), _> = with_retries(fast(), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(unavailable())
            }
        })
        .await;
        assert!(matches!(result, Err(TransitError::RemoteUnavailable(_))));
        // attempts = 3 → 3 retries, 4 total tries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = with_retries(fast(), move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TransitError::RemoteServerError {
                        status: 502,
                        message: "bad gateway".into(),
                    })
                } else {
                    Ok("recovered")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_propagates_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), _> = with_retries(fast(), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TransitError::RemoteRejected {
                    status: 403,
                    message: "permission denied".into(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(TransitError::RemoteRejected { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_means_single_try() {
        let settings = RetrySettings {
            attempts: 0,
            ..fast()
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), _> = with_retries(settings, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(unavailable())
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
