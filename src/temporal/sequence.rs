//! Temporal sequence: a value evolving between ordered samples.

use crate::error::{Result, TemporaError};
use crate::tbox::TBox;
use crate::temporal::{validate_instants, Interpolation, TInstant};
use serde::{Deserialize, Serialize};
use tempora_types::{Period, TimeDelta, Timestamp, Value, ValueType};

/// An ordered run of samples defining a value over a period, with either
/// stepwise or linear interpolation between consecutive samples.
///
/// Invariants, enforced at construction:
/// - at least one instant, strictly increasing timestamps, uniform type;
/// - a singleton sequence is inclusive on both bounds;
/// - integer-typed sequences are stepwise (integers do not interpolate).
///
/// # Examples
///
/// ```
/// use tempora::temporal::{Interpolation, TInstant, TSequence};
/// use tempora_types::{Timestamp, Value};
///
/// let seq = TSequence::new(
///     vec![
///         TInstant::new(Value::Float(10.0), Timestamp::from_secs(0)).unwrap(),
///         TInstant::new(Value::Float(20.0), Timestamp::from_secs(10)).unwrap(),
///     ],
///     true,
///     true,
///     Interpolation::Linear,
/// )
/// .unwrap();
/// assert_eq!(seq.value_at(Timestamp::from_secs(5)), Some(Value::Float(15.0)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TSequence {
    instants: Vec<TInstant>,
    lower_inc: bool,
    upper_inc: bool,
    interp: Interpolation,
    bbox: TBox,
}

impl TSequence {
    /// Build from a validated instant array and bound flags. Fails
    /// atomically with `Validation` on any broken invariant.
    pub fn new(
        instants: Vec<TInstant>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
    ) -> Result<Self> {
        let value_type = validate_instants(&instants)?;
        if instants.len() == 1 && !(lower_inc && upper_inc) {
            return Err(TemporaError::Validation(
                "a singleton sequence requires inclusive bounds on both sides".to_string(),
            ));
        }
        if interp == Interpolation::Linear && value_type == ValueType::Int {
            return Err(TemporaError::Validation(
                "integer sequences are stepwise; linear interpolation requires a continuous type"
                    .to_string(),
            ));
        }
        let bbox = TBox::from_instants(&instants, lower_inc, upper_inc);
        Ok(Self {
            instants,
            lower_inc,
            upper_inc,
            interp,
            bbox,
        })
    }

    /// Singleton sequence covering one instant.
    pub fn from_instant(inst: TInstant, interp: Interpolation) -> Result<Self> {
        Self::new(vec![inst], true, true, interp)
    }

    /// The ordered samples.
    pub fn instants(&self) -> &[TInstant] {
        &self.instants
    }

    /// Number of samples.
    pub fn num_instants(&self) -> usize {
        self.instants.len()
    }

    /// Sample at position `i`.
    pub fn instant_at(&self, i: usize) -> Option<&TInstant> {
        self.instants.get(i)
    }

    /// First sample.
    pub fn start_instant(&self) -> &TInstant {
        &self.instants[0]
    }

    /// Last sample.
    pub fn end_instant(&self) -> &TInstant {
        &self.instants[self.instants.len() - 1]
    }

    /// Whether the lower bound instant belongs to the sequence.
    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    /// Whether the upper bound instant belongs to the sequence.
    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    /// Interpolation between consecutive samples.
    pub fn interpolation(&self) -> Interpolation {
        self.interp
    }

    /// Type tag of the sampled values.
    pub fn value_type(&self) -> ValueType {
        self.instants[0].value_type()
    }

    /// Period covered by the sequence.
    pub fn time_span(&self) -> Period {
        Period::new(
            self.instants[0].timestamp(),
            self.instants[self.instants.len() - 1].timestamp(),
            self.lower_inc,
            self.upper_inc,
        )
    }

    /// Length of the covered period.
    pub fn duration(&self) -> TimeDelta {
        self.time_span().duration()
    }

    /// Bounding box computed at construction and expanded on append.
    pub fn bounding_box(&self) -> TBox {
        self.bbox
    }

    /// Value at `t`, interpolated per the sequence's mode; `None` outside
    /// the covered period.
    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        if !self.time_span().contains_timestamp(t) {
            return None;
        }
        // Index of the last sample at or before t. The period check above
        // guarantees it exists.
        let idx = self
            .instants
            .partition_point(|inst| inst.timestamp() <= t)
            .saturating_sub(1);
        let lower = &self.instants[idx];
        if lower.timestamp() == t || idx + 1 == self.instants.len() {
            return Some(lower.value());
        }
        match self.interp {
            Interpolation::Stepwise => Some(lower.value()),
            Interpolation::Linear => {
                let upper = &self.instants[idx + 1];
                let span = (upper.timestamp() - lower.timestamp()).as_micros() as f64;
                let frac = (t - lower.timestamp()).as_micros() as f64 / span;
                lower.value().lerp(&upper.value(), frac)
            }
        }
    }

    /// Smallest sampled value, by the value's own order. `None` for types
    /// without one.
    pub fn min_value(&self) -> Option<Value> {
        fold_extreme(&self.instants, std::cmp::Ordering::Less)
    }

    /// Largest sampled value, by the value's own order.
    pub fn max_value(&self) -> Option<Value> {
        fold_extreme(&self.instants, std::cmp::Ordering::Greater)
    }

    /// Extend the sequence by one instant at the end, re-validating ordering
    /// and growing the bounding box in place. O(1) amortized.
    pub fn append(&mut self, value: Value, t: Timestamp) -> Result<()> {
        let inst = TInstant::new(value, t)?;
        if value.value_type() != self.value_type() {
            return Err(TemporaError::TypeMismatch {
                expected: self.value_type(),
                actual: value.value_type(),
            });
        }
        if t <= self.end_instant().timestamp() {
            return Err(TemporaError::Validation(format!(
                "appended timestamp {} must follow the sequence end {}",
                t,
                self.end_instant().timestamp()
            )));
        }
        self.bbox.expand_instant(&inst);
        self.instants.push(inst);
        Ok(())
    }
}

pub(crate) fn fold_extreme(instants: &[TInstant], keep: std::cmp::Ordering) -> Option<Value> {
    let mut best = instants[0].value();
    for inst in &instants[1..] {
        match inst.value().cmp_same_type(&best) {
            Some(ord) if ord == keep => best = inst.value(),
            Some(_) => {}
            None => return None,
        }
    }
    Some(best)
}
