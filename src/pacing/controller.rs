use crate::config::PacingConfig;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Longest single sleep while a cooldown is active, so an externally
/// triggered cooldown change is observed promptly.
const COOLDOWN_POLL: Duration = Duration::from_secs(1);

/// Snapshot of the shared pacing state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingState {
    /// Minimum gap currently enforced between granted calls
    pub interval: Duration,

    /// When the gate last granted a call
    pub last_granted: Option<Instant>,

    /// Successes since the interval last changed
    pub success_count: u32,

    /// Whether a hard-throttle cooldown is in effect
    pub throttled: bool,

    /// When the current cooldown ends
    pub throttle_until: Option<Instant>,
}

impl PacingState {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_granted: None,
            success_count: 0,
            throttled: false,
            throttle_until: None,
        }
    }

    /// Returns how long the caller must wait before it may be granted,
    /// clearing an expired cooldown on the way.
    fn time_until_grant(&mut self, now: Instant) -> Option<Duration> {
        if self.throttled {
            match self.throttle_until {
                Some(until) if now < until => return Some((until - now).min(COOLDOWN_POLL)),
                _ => {
                    self.throttled = false;
                    self.throttle_until = None;
                    info!("Cooldown finished, resuming requests");
                }
            }
        }

        let last = self.last_granted?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.interval {
            Some(self.interval - elapsed)
        } else {
            None
        }
    }
}

/// Process-wide adaptive request pacer
///
/// Every remote call passes through [`PacingController::acquire`]. The
/// controller learns the safe request rate at runtime:
/// - sustained success gradually shortens the interval
/// - a soft throttle ("slow down") lengthens it
/// - a hard throttle (access denial / bot challenge) forces the maximum
///   interval and blocks every caller for a cooldown period
///
/// The state lives behind a single mutex that is never held across an
/// `.await`; callers check, release, sleep and recheck.
#[derive(Debug)]
pub struct PacingController {
    config: PacingConfig,
    state: Mutex<PacingState>,
}

impl PacingController {
    /// Creates a controller with the configured initial interval
    ///
    /// The initial interval is clamped into `[min, max]`.
    pub fn new(config: PacingConfig) -> Self {
        let initial = config
            .initial_interval()
            .clamp(config.min_interval(), config.max_interval());

        Self {
            state: Mutex::new(PacingState::new(initial)),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PacingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until one remote call may be issued, then records it
    ///
    /// The "is it time yet" check and the last-granted stamp happen under
    /// the same lock acquisition, so two callers can never pass the gate
    /// for the same slot.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.lock();
                let now = Instant::now();
                match state.time_until_grant(now) {
                    Some(wait) => wait,
                    None => {
                        state.last_granted = Some(now);
                        return;
                    }
                }
            };

            tokio::time::sleep(wait).await;
        }
    }

    /// Records a successful call; may shorten the interval
    pub fn report_success(&self) {
        let mut state = self.lock();
        if state.throttled {
            return;
        }

        state.success_count += 1;
        if state.success_count >= self.config.success_threshold {
            let faster = state
                .interval
                .mul_f64(self.config.speedup_factor)
                .max(self.config.min_interval());
            if faster < state.interval {
                debug!("Speeding up: interval {:?} -> {:?}", state.interval, faster);
                state.interval = faster;
            }
            state.success_count = 0;
        }
    }

    /// Records a "slow down" signal from the remote service
    pub fn report_soft_throttle(&self) {
        let mut state = self.lock();
        let slower = state
            .interval
            .mul_f64(self.config.slowdown_factor)
            .min(self.config.max_interval());
        state.interval = slower;
        state.success_count = 0;
        warn!("Request rate too high, slowing down to one call every {:?}", slower);
    }

    /// Records a defensive block from the remote service
    ///
    /// Has no effect while a cooldown is already running.
    pub fn report_hard_throttle(&self) {
        let mut state = self.lock();
        if state.throttled {
            return;
        }

        let cooldown = self.config.cooldown();
        state.throttled = true;
        state.throttle_until = Some(Instant::now() + cooldown);
        state.interval = self.config.max_interval();
        state.success_count = 0;
        error!("Remote service blocked requests, pausing for {:?}", cooldown);
    }

    /// Returns the current interval
    pub fn interval(&self) -> Duration {
        self.lock().interval
    }

    /// Returns a copy of the full pacing state
    pub fn snapshot(&self) -> PacingState {
        self.lock().clone()
    }
}
