/*
[INPUT]:  Consecutive failure count, backoff config, RNG for jitter
[OUTPUT]: Reconnect wait duration (exponential, saturating, jittered)
[POS]:    Reconnect policy - pure delay computation
[UPDATE]: When changing reconnect pacing
*/

use std::time::Duration;

use rand::Rng;

use crate::config::BackoffConfig;

/// Exponential reconnect delay: `min(base * 2^(failures - 1), max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
    jitter: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration, jitter: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            jitter,
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_ms),
            Duration::from_millis(config.max_ms),
            Duration::from_millis(config.jitter_ms),
        )
    }

    pub fn max_delay(&self) -> Duration {
        self.max
    }

    /// Deterministic delay; non-decreasing in `failure_count` and never above `max`.
    ///
    /// Zero failures is treated like one.
    pub fn delay(&self, failure_count: u32) -> Duration {
        let exp = failure_count.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exp)
            .unwrap_or(self.max)
            .min(self.max)
    }

    /// `delay` plus up to `jitter` of random spread, still clamped to `max`
    pub fn jittered_delay<R: Rng + ?Sized>(&self, failure_count: u32, rng: &mut R) -> Duration {
        let spread = self.jitter.as_millis() as u64;
        let extra = if spread == 0 {
            0
        } else {
            rng.gen_range(0..=spread)
        };
        (self.delay(failure_count) + Duration::from_millis(extra)).min(self.max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}
