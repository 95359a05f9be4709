//! Time axis primitives: timestamps, signed spans, and periods.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A point on the time axis with microsecond resolution.
///
/// Stored as signed microseconds relative to the Unix epoch, which keeps
/// arithmetic with [`TimeDelta`] closed over `i64`.
///
/// # Examples
///
/// ```
/// use tempora_types::{Timestamp, TimeDelta};
///
/// let t = Timestamp::from_secs(100);
/// assert_eq!(t + TimeDelta::from_secs(5), Timestamp::from_secs(105));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from microseconds since the epoch.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Create a timestamp from whole seconds since the epoch.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1_000_000)
    }

    /// Microseconds since the epoch.
    pub const fn as_micros(self) -> i64 {
        self.0
    }
}

impl Add<TimeDelta> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: TimeDelta) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs.0))
    }
}

impl Sub<TimeDelta> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: TimeDelta) -> Timestamp {
        Timestamp(self.0.saturating_sub(rhs.0))
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = TimeDelta;

    fn sub(self, rhs: Timestamp) -> TimeDelta {
        TimeDelta(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// A signed span of time with microsecond resolution.
///
/// # Examples
///
/// ```
/// use tempora_types::TimeDelta;
///
/// let d = TimeDelta::from_secs(5);
/// assert!(d.is_positive());
/// assert_eq!(d.as_micros(), 5_000_000);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TimeDelta(i64);

impl TimeDelta {
    /// Zero-length span.
    pub const ZERO: TimeDelta = TimeDelta(0);

    /// Create a span from microseconds.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Create a span from whole milliseconds.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * 1_000)
    }

    /// Create a span from whole seconds.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1_000_000)
    }

    /// Span length in microseconds.
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// True when the span is strictly positive.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for TimeDelta {
    type Output = TimeDelta;

    fn add(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// A time interval with per-bound inclusivity.
///
/// A period is degenerate (a single instant) when `lower == upper`, in which
/// case both bounds must be inclusive. Callers constructing periods from
/// validated instant arrays maintain `lower <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub lower: Timestamp,
    pub upper: Timestamp,
    pub lower_inc: bool,
    pub upper_inc: bool,
}

impl Period {
    /// Create a period. Bounds must satisfy `lower <= upper`, and a
    /// degenerate period must be inclusive on both sides.
    pub fn new(lower: Timestamp, upper: Timestamp, lower_inc: bool, upper_inc: bool) -> Self {
        debug_assert!(lower <= upper);
        debug_assert!(lower < upper || (lower_inc && upper_inc));
        Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        }
    }

    /// Closed degenerate period covering a single instant.
    pub fn at(t: Timestamp) -> Self {
        Self::new(t, t, true, true)
    }

    /// Length of the period.
    pub fn duration(&self) -> TimeDelta {
        self.upper - self.lower
    }

    /// True when the timestamp lies inside the period.
    pub fn contains_timestamp(&self, t: Timestamp) -> bool {
        let after_lower = t > self.lower || (t == self.lower && self.lower_inc);
        let before_upper = t < self.upper || (t == self.upper && self.upper_inc);
        after_lower && before_upper
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains_period(&self, other: &Period) -> bool {
        let lower_ok = self.lower < other.lower
            || (self.lower == other.lower && (self.lower_inc || !other.lower_inc));
        let upper_ok = self.upper > other.upper
            || (self.upper == other.upper && (self.upper_inc || !other.upper_inc));
        lower_ok && upper_ok
    }

    /// True when the two periods share at least one instant.
    pub fn overlaps(&self, other: &Period) -> bool {
        let (lo, lo_inc) = if self.lower > other.lower
            || (self.lower == other.lower && !self.lower_inc)
        {
            (self.lower, self.lower_inc)
        } else {
            (other.lower, other.lower_inc)
        };
        let (hi, hi_inc) = if self.upper < other.upper
            || (self.upper == other.upper && !self.upper_inc)
        {
            (self.upper, self.upper_inc)
        } else {
            (other.upper, other.upper_inc)
        };
        lo < hi || (lo == hi && lo_inc && hi_inc)
    }

    /// Translate both bounds by `delta`, keeping inclusivity.
    pub fn shift(&self, delta: TimeDelta) -> Period {
        Period {
            lower: self.lower + delta,
            upper: self.upper + delta,
            lower_inc: self.lower_inc,
            upper_inc: self.upper_inc,
        }
    }

    /// Extend `self` to also cover `other`.
    pub fn extend(&mut self, other: &Period) {
        if other.lower < self.lower {
            self.lower = other.lower;
            self.lower_inc = other.lower_inc;
        } else if other.lower == self.lower {
            self.lower_inc = self.lower_inc || other.lower_inc;
        }
        if other.upper > self.upper {
            self.upper = other.upper;
            self.upper_inc = other.upper_inc;
        } else if other.upper == self.upper {
            self.upper_inc = self.upper_inc || other.upper_inc;
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.lower_inc { '[' } else { '(' },
            self.lower,
            self.upper,
            if self.upper_inc { ']' } else { ')' },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_arithmetic() {
        let t = Timestamp::from_secs(10);
        assert_eq!(t + TimeDelta::from_secs(5), Timestamp::from_secs(15));
        assert_eq!(t - TimeDelta::from_secs(5), Timestamp::from_secs(5));
        assert_eq!(
            Timestamp::from_secs(15) - Timestamp::from_secs(10),
            TimeDelta::from_secs(5)
        );
    }

    #[test]
    fn test_period_contains_timestamp() {
        let p = Period::new(Timestamp::from_secs(0), Timestamp::from_secs(10), true, false);
        assert!(p.contains_timestamp(Timestamp::from_secs(0)));
        assert!(p.contains_timestamp(Timestamp::from_secs(5)));
        assert!(!p.contains_timestamp(Timestamp::from_secs(10)));
    }

    #[test]
    fn test_period_overlaps() {
        let a = Period::new(Timestamp::from_secs(0), Timestamp::from_secs(10), true, false);
        let b = Period::new(Timestamp::from_secs(10), Timestamp::from_secs(20), true, true);
        // Adjacent with exclusive/inclusive boundary: no shared instant.
        assert!(!a.overlaps(&b));

        let c = Period::new(Timestamp::from_secs(5), Timestamp::from_secs(15), true, true);
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_period_contains_period() {
        let outer = Period::new(Timestamp::from_secs(0), Timestamp::from_secs(10), true, true);
        let inner = Period::new(Timestamp::from_secs(2), Timestamp::from_secs(8), true, false);
        assert!(outer.contains_period(&inner));
        assert!(!inner.contains_period(&outer));

        // Same bounds, weaker inclusivity is contained.
        let open = Period::new(Timestamp::from_secs(0), Timestamp::from_secs(10), false, false);
        assert!(outer.contains_period(&open));
        assert!(!open.contains_period(&outer));
    }

    #[test]
    fn test_period_shift() {
        let p = Period::new(Timestamp::from_secs(0), Timestamp::from_secs(10), true, false);
        let shifted = p.shift(TimeDelta::from_secs(3));
        assert_eq!(shifted.lower, Timestamp::from_secs(3));
        assert_eq!(shifted.upper, Timestamp::from_secs(13));
        assert!(shifted.lower_inc);
        assert!(!shifted.upper_inc);
    }

    #[test]
    fn test_period_extend() {
        let mut p = Period::new(Timestamp::from_secs(2), Timestamp::from_secs(5), true, true);
        p.extend(&Period::new(
            Timestamp::from_secs(0),
            Timestamp::from_secs(4),
            false,
            true,
        ));
        assert_eq!(p.lower, Timestamp::from_secs(0));
        assert!(!p.lower_inc);
        assert_eq!(p.upper, Timestamp::from_secs(5));

        p.extend(&Period::new(
            Timestamp::from_secs(1),
            Timestamp::from_secs(9),
            true,
            false,
        ));
        assert_eq!(p.upper, Timestamp::from_secs(9));
        assert!(!p.upper_inc);
    }
}
