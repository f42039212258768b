//! Time primitives shared across the buffer crates.
//!
//! The buffer never reads a clock itself; callers stamp every sample with a
//! monotonic [`TimePoint`] and the buffer only relies on ordering and signed
//! subtraction. Nanosecond integer representation keeps comparisons exact.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Signed duration with nanosecond resolution.
///
/// Serializes as floating-point seconds so configuration files can write
/// `reset_threshold = 1.0` instead of raw nanosecond counts.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeDelta(i64);

impl TimeDelta {
    pub const ZERO: Self = TimeDelta(0);

    #[inline]
    pub const fn from_nanos(nanos: i64) -> Self {
        TimeDelta(nanos)
    }

    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        TimeDelta(micros * NANOS_PER_MICRO)
    }

    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        TimeDelta(millis * NANOS_PER_MILLI)
    }

    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        TimeDelta(secs * NANOS_PER_SEC)
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        TimeDelta((secs * NANOS_PER_SEC as f64) as i64)
    }

    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    #[inline]
    pub const fn abs(self) -> Self {
        TimeDelta(self.0.abs())
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for TimeDelta {
    type Output = TimeDelta;

    fn add(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta(self.0 + rhs.0)
    }
}

impl Sub for TimeDelta {
    type Output = TimeDelta;

    fn sub(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta(self.0 - rhs.0)
    }
}

impl Neg for TimeDelta {
    type Output = TimeDelta;

    fn neg(self) -> TimeDelta {
        TimeDelta(-self.0)
    }
}

impl Mul<i64> for TimeDelta {
    type Output = TimeDelta;

    fn mul(self, rhs: i64) -> TimeDelta {
        TimeDelta(self.0 * rhs)
    }
}

impl Div<i64> for TimeDelta {
    type Output = TimeDelta;

    fn div(self, rhs: i64) -> TimeDelta {
        TimeDelta(self.0 / rhs)
    }
}

impl fmt::Debug for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs_f64())
    }
}

impl Serialize for TimeDelta {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.as_secs_f64())
    }
}

impl<'de> Deserialize<'de> for TimeDelta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(TimeDelta::from_secs_f64(secs))
    }
}

/// A monotonic instant, stored as nanoseconds from an arbitrary epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimePoint(i64);

impl TimePoint {
    /// The zero instant. Freshly constructed buffers start here.
    pub const EPOCH: Self = TimePoint(0);
    pub const MAX: Self = TimePoint(i64::MAX);

    #[inline]
    pub const fn from_nanos(nanos: i64) -> Self {
        TimePoint(nanos)
    }

    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        TimePoint(micros * NANOS_PER_MICRO)
    }

    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        TimePoint(millis * NANOS_PER_MILLI)
    }

    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        TimePoint(secs * NANOS_PER_SEC)
    }

    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }
}

impl Sub for TimePoint {
    type Output = TimeDelta;

    fn sub(self, rhs: TimePoint) -> TimeDelta {
        TimeDelta(self.0 - rhs.0)
    }
}

impl Add<TimeDelta> for TimePoint {
    type Output = TimePoint;

    fn add(self, rhs: TimeDelta) -> TimePoint {
        TimePoint(self.0 + rhs.as_nanos())
    }
}

impl Sub<TimeDelta> for TimePoint {
    type Output = TimePoint;

    fn sub(self, rhs: TimeDelta) -> TimePoint {
        TimePoint(self.0 - rhs.as_nanos())
    }
}

impl AddAssign<TimeDelta> for TimePoint {
    fn add_assign(&mut self, rhs: TimeDelta) {
        self.0 += rhs.as_nanos();
    }
}

impl SubAssign<TimeDelta> for TimePoint {
    fn sub_assign(&mut self, rhs: TimeDelta) {
        self.0 -= rhs.as_nanos();
    }
}

impl fmt::Debug for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
