//! Bounding-box synopsis for temporal values.
//!
//! A [`TBox`] is the minimal enclosing value-extent × time-extent of a
//! temporal value. It is computed once at construction with an O(n) fold,
//! expanded in O(1) on append, and consumed by external index layers for
//! range-query pruning through the `contains`/`contained`/`overlaps`/`same`
//! predicates. Boxes only ever grow; nothing shrinks one in place.

use crate::temporal::TInstant;
use serde::{Deserialize, Serialize};
use tempora_types::{Period, TimeDelta};

/// Value × time bounding box.
///
/// The value dimension is a closed interval over the numeric projection of
/// the instant values; the time dimension is a [`Period`] carrying bound
/// inclusivity.
///
/// # Examples
///
/// ```
/// use tempora::tbox::TBox;
/// use tempora::temporal::TInstant;
/// use tempora_types::{Timestamp, Value};
///
/// let a = TInstant::new(Value::Int(3), Timestamp::from_secs(0)).unwrap();
/// let b = TInstant::new(Value::Int(9), Timestamp::from_secs(10)).unwrap();
/// let mut tbox = TBox::from_instant(&a);
/// tbox.expand_instant(&b);
/// assert_eq!(tbox.vmin(), 3.0);
/// assert_eq!(tbox.vmax(), 9.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TBox {
    vmin: f64,
    vmax: f64,
    period: Period,
}

impl TBox {
    /// Box of a single instant: degenerate on both dimensions.
    pub fn from_instant(inst: &TInstant) -> Self {
        let v = inst.value().as_f64();
        Self {
            vmin: v,
            vmax: v,
            period: Period::at(inst.timestamp()),
        }
    }

    /// Box of an ordered instant array with the given time-bound
    /// inclusivity. O(n) fold over values; the time extent comes from the
    /// first and last timestamps.
    pub fn from_instants(instants: &[TInstant], lower_inc: bool, upper_inc: bool) -> Self {
        debug_assert!(!instants.is_empty());
        let mut vmin = f64::INFINITY;
        let mut vmax = f64::NEG_INFINITY;
        for inst in instants {
            let v = inst.value().as_f64();
            vmin = vmin.min(v);
            vmax = vmax.max(v);
        }
        let lower = instants[0].timestamp();
        let upper = instants[instants.len() - 1].timestamp();
        let (lower_inc, upper_inc) = if lower == upper {
            (true, true)
        } else {
            (lower_inc, upper_inc)
        };
        Self {
            vmin,
            vmax,
            period: Period::new(lower, upper, lower_inc, upper_inc),
        }
    }

    /// Minimum of the value dimension.
    pub fn vmin(&self) -> f64 {
        self.vmin
    }

    /// Maximum of the value dimension.
    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    /// Time extent.
    pub fn period(&self) -> &Period {
        &self.period
    }

    /// O(1) union update with one more instant. Used by `append`, where the
    /// new instant extends the time upper bound.
    pub fn expand_instant(&mut self, inst: &TInstant) {
        let v = inst.value().as_f64();
        self.vmin = self.vmin.min(v);
        self.vmax = self.vmax.max(v);
        let t = inst.timestamp();
        if t > self.period.upper {
            self.period = Period::new(self.period.lower, t, self.period.lower_inc, true);
        } else if t < self.period.lower {
            self.period = Period::new(t, self.period.upper, true, self.period.upper_inc);
        }
    }

    /// Union with another box, on both dimensions.
    pub fn expand(&mut self, other: &TBox) {
        self.vmin = self.vmin.min(other.vmin);
        self.vmax = self.vmax.max(other.vmax);
        self.period.extend(&other.period);
    }

    /// True when `other` lies entirely inside `self`, on both the value and
    /// the time dimension.
    pub fn contains(&self, other: &TBox) -> bool {
        self.vmin <= other.vmin
            && self.vmax >= other.vmax
            && self.period.contains_period(&other.period)
    }

    /// True when `self` lies entirely inside `other`.
    pub fn contained(&self, other: &TBox) -> bool {
        other.contains(self)
    }

    /// True when the boxes share at least one point on both dimensions.
    pub fn overlaps(&self, other: &TBox) -> bool {
        self.vmin <= other.vmax && self.vmax >= other.vmin && self.period.overlaps(&other.period)
    }

    /// True when both dimensions are pairwise equal, including time-bound
    /// inclusivity.
    pub fn same(&self, other: &TBox) -> bool {
        self.vmin == other.vmin && self.vmax == other.vmax && self.period == other.period
    }

    /// Translate the time dimension by `delta`, leaving the value dimension
    /// untouched. Relocates a box without rescanning instants.
    pub fn shift(&mut self, delta: TimeDelta) {
        self.period = self.period.shift(delta);
    }
}
