//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Backoff schedule for retried batches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound on the un-jittered delay.
    pub cap: Duration,
    /// Jitter ratio in `[0, 1]`: up to `jitter * delay` is added at random.
    pub jitter: f64,
}

impl Backoff {
    /// Un-jittered delay before retry number `attempt` (1-based):
    /// `min(base * 2^(attempt - 1), cap)`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let multiplier = 2_u32.saturating_pow(exponent);
        std::cmp::min(self.base.saturating_mul(multiplier), self.cap)
    }

    /// Delay with uniform jitter in `[0, jitter * delay]` added.
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = self.base_delay(attempt);
        let ratio = self.jitter.clamp(0.0, 1.0);
        if ratio <= 0.0 || delay.is_zero() {
            return delay;
        }

        let max_extra = delay.as_secs_f64() * ratio;
        let extra = rand::thread_rng().gen_range(0.0..=max_extra);
        delay.saturating_add(Duration::from_secs_f64(extra))
    }
}
