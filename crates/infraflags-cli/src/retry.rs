use infraflags_core::config::RetryConfig;
use infraflags_core::Result;
use std::future::Future;
use std::time::Duration;

/// Caller-side retry for transport failures. The core never retries; CI and
/// interactive runs pick their own policy through config or `--retries`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub attempts: u32,
    /// Base delay; attempt `n` waits `n * backoff`.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Wait before retry number `attempt` (1-based). Saturates instead of
    /// overflowing on huge configured backoffs.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }

    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    attempt += 1;
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        attempt,
                        of = self.attempts,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after transport failure: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            attempts: cfg.attempts,
            backoff: Duration::from_millis(cfg.backoff_ms),
        }
    }
}
