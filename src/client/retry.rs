use crate::client::classify::{classify, FailureKind};
use crate::config::RetryConfig;
use crate::pacing::PacingController;
use crate::remote::RemoteResult;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Upper bound for a single transient backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// Wraps every remote call with pacing, classification and retries
///
/// # Retry Logic
///
/// | Failure | Action |
/// |---------|--------|
/// | SoftThrottle | slow the shared pace, settle, retry (no limit) |
/// | HardThrottle | start a cooldown, retry once the gate reopens (no limit) |
/// | Fatal | return the error immediately |
/// | Transient | `base * factor^(n-1) + jitter` backoff, at most `max_retries` times |
///
/// Throttle retries are unbounded: the pacing controller keeps slowing down
/// until the service accepts the rate.
#[derive(Debug, Clone)]
pub struct RetryingCaller {
    pacer: Arc<PacingController>,
    config: RetryConfig,
}

impl RetryingCaller {
    pub fn new(pacer: Arc<PacingController>, config: RetryConfig) -> Self {
        Self { pacer, config }
    }

    /// The pacing gate shared with every other caller
    pub fn pacer(&self) -> &Arc<PacingController> {
        &self.pacer
    }

    /// Runs `operation` until it succeeds or fails in a non-retryable way
    ///
    /// # Arguments
    ///
    /// * `label` - Short description used in log messages
    /// * `operation` - Produces a fresh remote future for every attempt
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The operation eventually succeeded
    /// * `Err(RemoteError)` - Fatal failure, or the transient budget ran out
    pub async fn call<T, F, Fut>(&self, label: &str, mut operation: F) -> RemoteResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let mut retries = 0u32;

        loop {
            self.pacer.acquire().await;

            let failure = match operation().await {
                Ok(value) => {
                    self.pacer.report_success();
                    return Ok(value);
                }
                Err(e) => e,
            };

            match classify(&failure) {
                FailureKind::SoftThrottle => {
                    debug!("{}: soft throttle ({})", label, failure);
                    self.pacer.report_soft_throttle();
                    tokio::time::sleep(self.config.soft_throttle_pause()).await;
                }
                FailureKind::HardThrottle => {
                    debug!("{}: hard throttle ({})", label, failure);
                    self.pacer.report_hard_throttle();
                }
                FailureKind::Fatal => {
                    warn!("{}: {}", label, failure);
                    return Err(failure);
                }
                FailureKind::Transient => {
                    if retries >= self.config.max_retries {
                        error!(
                            "{}: giving up after {} retries: {}",
                            label, retries, failure
                        );
                        return Err(failure);
                    }

                    retries += 1;
                    let delay = self.backoff_delay(retries);
                    debug!(
                        "{}: transient failure ({}), retry {} in {:?}",
                        label, failure, retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Backoff before transient retry number `attempt` (1-indexed)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let seconds = self.config.base_backoff().as_secs_f64() * self.config.backoff_factor.powi(exponent);
        let base = Duration::try_from_secs_f64(seconds)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF);

        base + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let bound = self.config.jitter();
        if bound.is_zero() {
            return Duration::ZERO;
        }
        rand::thread_rng().gen_range(Duration::ZERO..=bound)
    }
}
