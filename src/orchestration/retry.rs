//! Attempt budget and capped exponential backoff for proposer calls.

use std::thread;
use std::time::Duration;

use crate::workspace::ProposerSettings;

/// Blocks the current thread between attempts. Swappable so tests run
/// without real delays.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration) {}
}

/// Delay before retry `attempt` (0-based) is `unit * min(2^attempt, max_units)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
    pub max_backoff_units: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_unit: Duration, max_backoff_units: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
            max_backoff_units: max_backoff_units.max(1),
        }
    }

    pub fn from_settings(settings: &ProposerSettings) -> Self {
        Self::new(
            settings.max_attempts,
            settings.backoff_unit(),
            settings.max_backoff_units,
        )
    }

    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let units = 2u32
            .checked_pow(attempt)
            .unwrap_or(u32::MAX)
            .min(self.max_backoff_units);
        self.backoff_unit * units
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&ProposerSettings::default())
    }
}
