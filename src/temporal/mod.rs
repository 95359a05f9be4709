//! The temporal value model: four duration variants behind one sum type.
//!
//! A [`Temporal`] is a base value paired with its evolution over time. The
//! four shapes — [`TInstant`], [`TInstantSet`], [`TSequence`],
//! [`TSequenceSet`] — share the capability set `{time_span, value_at,
//! bounding_box, append}`, dispatched by exhaustive `match` on the variant
//! tag. Values are immutable after construction except for end-only
//! `append` on the sequence shapes.

mod instant;
mod instant_set;
mod sequence;
mod sequence_set;

pub use instant::TInstant;
pub use instant_set::TInstantSet;
pub use sequence::TSequence;
pub use sequence_set::TSequenceSet;

use crate::error::{Result, TemporaError};
use crate::tbox::TBox;
use serde::{Deserialize, Serialize};
use tempora_types::{Period, TimeDelta, Timestamp, Value, ValueType};

/// How a sequence evolves between consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// The value holds constant until the next sample.
    Stepwise,
    /// The value is interpolated linearly between samples.
    Linear,
}

impl Interpolation {
    /// Default interpolation for a base type: continuous types interpolate,
    /// integers hold.
    pub fn default_for(value_type: ValueType) -> Interpolation {
        match value_type {
            ValueType::Int => Interpolation::Stepwise,
            ValueType::Float | ValueType::SumCount => Interpolation::Linear,
        }
    }
}

/// Validate an instant array shared by every composite constructor: at
/// least one instant, strictly increasing timestamps, one value type.
/// Returns the common type.
pub(crate) fn validate_instants(instants: &[TInstant]) -> Result<ValueType> {
    let Some(first) = instants.first() else {
        return Err(TemporaError::Validation(
            "a temporal value requires at least one instant".to_string(),
        ));
    };
    let value_type = first.value_type();
    for pair in instants.windows(2) {
        if pair[1].timestamp() <= pair[0].timestamp() {
            return Err(TemporaError::Validation(format!(
                "instant timestamps must be strictly increasing, got {} after {}",
                pair[1].timestamp(),
                pair[0].timestamp()
            )));
        }
    }
    for inst in instants {
        if inst.value_type() != value_type {
            return Err(TemporaError::TypeMismatch {
                expected: value_type,
                actual: inst.value_type(),
            });
        }
    }
    Ok(value_type)
}

/// A temporal value: one of the four duration variants.
///
/// # Examples
///
/// ```
/// use tempora::temporal::{Temporal, TInstant};
/// use tempora_types::{Timestamp, Value};
///
/// let temp = Temporal::Instant(
///     TInstant::new(Value::Int(7), Timestamp::from_secs(0)).unwrap(),
/// );
/// assert_eq!(temp.num_instants(), 1);
/// assert_eq!(temp.value_at(Timestamp::from_secs(0)), Some(Value::Int(7)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Temporal {
    Instant(TInstant),
    InstantSet(TInstantSet),
    Sequence(TSequence),
    SequenceSet(TSequenceSet),
}

impl Temporal {
    /// Type tag of the carried base values.
    pub fn value_type(&self) -> ValueType {
        match self {
            Temporal::Instant(v) => v.value_type(),
            Temporal::InstantSet(v) => v.value_type(),
            Temporal::Sequence(v) => v.value_type(),
            Temporal::SequenceSet(v) => v.value_type(),
        }
    }

    /// Interpolation mode. Discrete shapes report the default for their
    /// base type.
    pub fn interpolation(&self) -> Interpolation {
        match self {
            Temporal::Instant(v) => Interpolation::default_for(v.value_type()),
            Temporal::InstantSet(v) => Interpolation::default_for(v.value_type()),
            Temporal::Sequence(v) => v.interpolation(),
            Temporal::SequenceSet(v) => v.interpolation(),
        }
    }

    /// Value at `t`, or `None` where the value is undefined.
    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        match self {
            Temporal::Instant(v) => v.value_at(t),
            Temporal::InstantSet(v) => v.value_at(t),
            Temporal::Sequence(v) => v.value_at(t),
            Temporal::SequenceSet(v) => v.value_at(t),
        }
    }

    /// Overall time extent.
    pub fn time_span(&self) -> Period {
        match self {
            Temporal::Instant(v) => v.time_span(),
            Temporal::InstantSet(v) => v.time_span(),
            Temporal::Sequence(v) => v.time_span(),
            Temporal::SequenceSet(v) => v.time_span(),
        }
    }

    /// Number of samples.
    pub fn num_instants(&self) -> usize {
        match self {
            Temporal::Instant(_) => 1,
            Temporal::InstantSet(v) => v.num_instants(),
            Temporal::Sequence(v) => v.num_instants(),
            Temporal::SequenceSet(v) => v.num_instants(),
        }
    }

    /// Sample at position `i` in time order.
    pub fn instant_at(&self, i: usize) -> Option<&TInstant> {
        match self {
            Temporal::Instant(v) => (i == 0).then_some(v),
            Temporal::InstantSet(v) => v.instant_at(i),
            Temporal::Sequence(v) => v.instant_at(i),
            Temporal::SequenceSet(v) => v.instant_at(i),
        }
    }

    /// First sample.
    pub fn start_instant(&self) -> &TInstant {
        self.instant_at(0).expect("temporal values are non-empty")
    }

    /// Last sample.
    pub fn end_instant(&self) -> &TInstant {
        self.instant_at(self.num_instants() - 1)
            .expect("temporal values are non-empty")
    }

    /// Bounding box. Composite shapes return the box maintained since
    /// construction; instants compute their trivial box on demand.
    pub fn bounding_box(&self) -> TBox {
        match self {
            Temporal::Instant(v) => v.bounding_box(),
            Temporal::InstantSet(v) => v.bounding_box(),
            Temporal::Sequence(v) => v.bounding_box(),
            Temporal::SequenceSet(v) => v.bounding_box(),
        }
    }

    /// Smallest sampled value, when the base type carries an order.
    pub fn min_value(&self) -> Option<Value> {
        match self {
            Temporal::Instant(v) => Some(v.value()),
            Temporal::InstantSet(v) => sequence::fold_extreme(v.instants(), std::cmp::Ordering::Less),
            Temporal::Sequence(v) => v.min_value(),
            Temporal::SequenceSet(v) => v
                .sequences()
                .iter()
                .filter_map(TSequence::min_value)
                .reduce(|a, b| match a.cmp_same_type(&b) {
                    Some(std::cmp::Ordering::Greater) => b,
                    _ => a,
                }),
        }
    }

    /// Largest sampled value, when the base type carries an order.
    pub fn max_value(&self) -> Option<Value> {
        match self {
            Temporal::Instant(v) => Some(v.value()),
            Temporal::InstantSet(v) => {
                sequence::fold_extreme(v.instants(), std::cmp::Ordering::Greater)
            }
            Temporal::Sequence(v) => v.max_value(),
            Temporal::SequenceSet(v) => v
                .sequences()
                .iter()
                .filter_map(TSequence::max_value)
                .reduce(|a, b| match a.cmp_same_type(&b) {
                    Some(std::cmp::Ordering::Less) => b,
                    _ => a,
                }),
        }
    }

    /// Summed covered duration. Zero for the discrete shapes.
    pub fn duration(&self) -> TimeDelta {
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => TimeDelta::ZERO,
            Temporal::Sequence(v) => v.duration(),
            Temporal::SequenceSet(v) => v.duration(),
        }
    }

    /// Extend a sequence-shaped value by one instant at the end. The
    /// discrete shapes do not support appending.
    pub fn append(&mut self, value: Value, t: Timestamp) -> Result<()> {
        match self {
            Temporal::Sequence(v) => v.append(value, t),
            Temporal::SequenceSet(v) => v.append(value, t),
            Temporal::Instant(_) | Temporal::InstantSet(_) => Err(TemporaError::Unsupported(
                "append is defined for sequence and sequence-set values only".to_string(),
            )),
        }
    }
}
