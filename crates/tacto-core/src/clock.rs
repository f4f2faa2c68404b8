//! Session clock implementations
//!
//! The decoder never reads wall-clock time directly; it is handed a clock
//! at construction. This keeps frame gating and kinematics deterministic
//! under test.

use std::time::Instant;

use parking_lot::Mutex;

use crate::TuioTime;

/// Source of session-relative time
pub trait SessionClock: Send + Sync {
    /// Current time since the session epoch
    fn now(&self) -> TuioTime;
}

/// Monotonic session clock backed by the OS clock
/// INVARIANT: never jumps backwards; the epoch is fixed at construction
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Create a clock whose epoch is the moment of construction
    pub fn new() -> Self {
        MonotonicClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock for MonotonicClock {
    fn now(&self) -> TuioTime {
        TuioTime::from_duration(self.epoch.elapsed())
    }
}

/// Manually driven clock for deterministic tests
pub struct ManualClock {
    now: Mutex<TuioTime>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            now: Mutex::new(TuioTime::ZERO),
        }
    }

    /// Set the current session time
    pub fn set(&self, time: TuioTime) {
        *self.now.lock() = time;
    }

    /// Advance the current session time by a millisecond delta
    pub fn advance_millis(&self, millis: i64) {
        let mut now = self.now.lock();
        *now = *now + TuioTime::from_millis(millis);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock for ManualClock {
    fn now(&self) -> TuioTime {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), TuioTime::ZERO);

        clock.advance_millis(250);
        assert_eq!(clock.now().total_millis(), 250);

        clock.set(TuioTime::new(5, 0));
        assert_eq!(clock.now().seconds(), 5);
    }
}
