//! General time utility functions

use serde::{Deserialize, Serialize};

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// A minimum interval between two attempts at an action.
///
/// All times are session elapsed seconds, passed in by the caller so the gate never reads a
/// clock itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    /// Minimum time between two attempts.
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Time before which the gate stays closed, `None` if it has never been armed.
    #[serde(skip)]
    ready_at_s: Option<f64>,
}

impl Cooldown {
    pub fn new(period_s: f64) -> Self {
        Self {
            period_s,
            ready_at_s: None,
        }
    }

    /// True if an attempt may be made at `now_s`.
    pub fn is_ready(&self, now_s: f64) -> bool {
        match self.ready_at_s {
            Some(t) => now_s >= t,
            None => true,
        }
    }

    /// Record an attempt at `now_s`, closing the gate for one period.
    pub fn trigger(&mut self, now_s: f64) {
        self.ready_at_s = Some(now_s + self.period_s);
    }

    /// Close the gate until `now_s + hold_s`, regardless of the period.
    pub fn hold(&mut self, now_s: f64, hold_s: f64) {
        self.ready_at_s = Some(now_s + hold_s);
    }

    /// If the gate is open at `now_s` trigger it and return true, otherwise return false.
    pub fn try_trigger(&mut self, now_s: f64) -> bool {
        if self.is_ready(now_s) {
            self.trigger(now_s);
            true
        } else {
            false
        }
    }

    /// Open the gate immediately.
    pub fn reset(&mut self) {
        self.ready_at_s = None;
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cooldown() {
        let mut cd = Cooldown::new(0.2);

        assert!(cd.try_trigger(0.0));
        assert!(!cd.try_trigger(0.1));
        assert!(cd.try_trigger(0.2));

        cd.hold(0.2, 1.0);
        assert!(!cd.is_ready(1.1));
        assert!(cd.is_ready(1.2));

        cd.reset();
        assert!(cd.is_ready(0.0));
    }
}
