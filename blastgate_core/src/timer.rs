//! Single-shot grace timer.

use std::time::{Duration, Instant};

/// Countdown armed with an explicit start instant. Time is passed in by the
/// caller so the timer itself never reads a clock.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    armed: Option<(Instant, Duration)>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer to expire `timeout` after `now`.
    pub fn set(&mut self, now: Instant, timeout: Duration) {
        self.armed = Some((now, timeout));
    }

    pub fn clear(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Check-and-clear: returns true once when the timeout has elapsed, then
    /// disarms. Always false while unarmed.
    pub fn expired(&mut self, now: Instant) -> bool {
        match self.armed {
            Some((start, timeout)) if now.saturating_duration_since(start) >= timeout => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }

    /// Time left before expiry, if armed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.armed
            .map(|(start, timeout)| timeout.saturating_sub(now.saturating_duration_since(start)))
    }
}
