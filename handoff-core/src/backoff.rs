// ABOUTME: Bounded exponential backoff for push channel reconnection.
// ABOUTME: Yields 2s, 4s, 8s... capped at max_delay, and gives up after max_attempts failures.

use std::time::Duration;

/// Reconnect policy for the push channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay before the first reconnect attempt
    pub initial_delay: Duration,
    /// Ceiling for any single delay
    pub max_delay: Duration,
    /// Growth factor applied after each failure
    pub multiplier: u32,
    /// Consecutive failures tolerated before the channel is declared exhausted
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
            max_attempts: 5,
        }
    }
}

/// Consecutive-failure tracker driving the reconnect loop
#[derive(Debug)]
pub struct BackoffState {
    config: BackoffConfig,
    failures: u32,
    next_delay: Duration,
}

impl BackoffState {
    pub fn new(config: BackoffConfig) -> Self {
        let next_delay = config.initial_delay;
        Self {
            config,
            failures: 0,
            next_delay,
        }
    }

    /// A connection was established; the next drop starts from the initial delay
    pub fn record_success(&mut self) {
        self.failures = 0;
        self.next_delay = self.config.initial_delay;
    }

    /// Returns the wait before the next attempt, or None once attempts are exhausted
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.failures += 1;
        if self.failures > self.config.max_attempts {
            return None;
        }

        let delay = self.next_delay;
        self.next_delay = self
            .next_delay
            .checked_mul(self.config.multiplier)
            .map_or(self.config.max_delay, |d| d.min(self.config.max_delay));
        Some(delay)
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn is_exhausted(&self) -> bool {
        self.failures > self.config.max_attempts
    }
}
