//! Session time primitives
//!
//! All times reported by the decoder are relative to an explicit session
//! epoch established when the session clock is constructed. A time is an
//! ordered (seconds, microseconds) pair, normalized so that
//! 0 <= microseconds < 1_000_000.

use std::ops::{Add, Sub};
use std::time::Duration;

const MICROS_PER_SECOND: i64 = 1_000_000;

/// Session-relative timestamp as a (seconds, microseconds) pair
/// INVARIANT: 0 <= microseconds < 1_000_000
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TuioTime {
    seconds: i64,
    microseconds: i64,
}

impl TuioTime {
    pub const ZERO: TuioTime = TuioTime {
        seconds: 0,
        microseconds: 0,
    };

    /// Create a time from a (seconds, microseconds) pair, carrying
    /// overflow and borrowing underflow into the seconds field
    #[inline]
    pub fn new(seconds: i64, microseconds: i64) -> Self {
        TuioTime {
            seconds: seconds + microseconds.div_euclid(MICROS_PER_SECOND),
            microseconds: microseconds.rem_euclid(MICROS_PER_SECOND),
        }
    }

    #[inline]
    pub fn from_micros(micros: i64) -> Self {
        TuioTime::new(0, micros)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        TuioTime {
            seconds: millis / 1000,
            microseconds: 1000 * (millis % 1000),
        }
    }

    #[inline]
    pub fn from_duration(d: Duration) -> Self {
        TuioTime {
            seconds: d.as_secs() as i64,
            microseconds: d.subsec_micros() as i64,
        }
    }

    #[inline]
    pub fn seconds(self) -> i64 {
        self.seconds
    }

    #[inline]
    pub fn microseconds(self) -> i64 {
        self.microseconds
    }

    #[inline]
    pub fn total_millis(self) -> i64 {
        self.seconds * 1000 + self.microseconds / 1000
    }

    #[inline]
    pub fn total_micros(self) -> i64 {
        self.seconds * MICROS_PER_SECOND + self.microseconds
    }

    #[inline]
    pub fn as_secs_f32(self) -> f32 {
        self.seconds as f32 + self.microseconds as f32 / MICROS_PER_SECOND as f32
    }

    /// Shift this time by a microsecond offset (may be negative)
    #[inline]
    pub fn add_micros(self, micros: i64) -> Self {
        TuioTime::new(self.seconds, self.microseconds + micros)
    }
}

impl Add<TuioTime> for TuioTime {
    type Output = TuioTime;

    #[inline]
    fn add(self, rhs: TuioTime) -> Self::Output {
        TuioTime::new(self.seconds + rhs.seconds, self.microseconds + rhs.microseconds)
    }
}

impl Sub<TuioTime> for TuioTime {
    type Output = TuioTime;

    #[inline]
    fn sub(self, rhs: TuioTime) -> Self::Output {
        TuioTime::new(self.seconds - rhs.seconds, self.microseconds - rhs.microseconds)
    }
}

impl std::fmt::Debug for TuioTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:06}s", self.seconds, self.microseconds)
    }
}
