//! Temporal instant set: discrete samples, stored time-sorted.

use crate::error::Result;
use crate::tbox::TBox;
use crate::temporal::{validate_instants, TInstant};
use serde::{Deserialize, Serialize};
use tempora_types::{Period, Timestamp, Value, ValueType};

/// An ordered array of discrete samples with strictly increasing timestamps.
/// The value is defined only at the sample instants. Immutable after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TInstantSet {
    instants: Vec<TInstant>,
    bbox: TBox,
}

impl TInstantSet {
    /// Build from a validated instant array: at least one instant, strictly
    /// increasing timestamps, uniform value type. Fails atomically.
    pub fn new(instants: Vec<TInstant>) -> Result<Self> {
        validate_instants(&instants)?;
        let bbox = TBox::from_instants(&instants, true, true);
        Ok(Self { instants, bbox })
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

    /// Type tag of the sampled values.
    pub fn value_type(&self) -> ValueType {
        self.instants[0].value_type()
    }

    /// Value at `t`, defined only when `t` hits a sample exactly.
    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        self.instants
            .binary_search_by_key(&t, |inst| inst.timestamp())
            .ok()
            .map(|i| self.instants[i].value())
    }

    /// Period from the first to the last sample, both inclusive.
    pub fn time_span(&self) -> Period {
        Period::new(
            self.instants[0].timestamp(),
            self.instants[self.instants.len() - 1].timestamp(),
            true,
            true,
        )
    }

    /// Bounding box computed at construction.
    pub fn bounding_box(&self) -> TBox {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemporaError;

    fn inst(v: i32, secs: i64) -> TInstant {
        TInstant::new(Value::Int(v), Timestamp::from_secs(secs)).unwrap()
    }

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            TInstantSet::new(vec![]),
            Err(TemporaError::Validation(_))
        ));
        assert!(matches!(
            TInstantSet::new(vec![inst(1, 5), inst(2, 5)]),
            Err(TemporaError::Validation(_))
        ));
        assert!(matches!(
            TInstantSet::new(vec![inst(1, 5), inst(2, 3)]),
            Err(TemporaError::Validation(_))
        ));
        assert!(TInstantSet::new(vec![inst(1, 1), inst(2, 2)]).is_ok());
    }

    #[test]
    fn test_value_at_exact_only() {
        let set = TInstantSet::new(vec![inst(1, 1), inst(2, 2), inst(3, 4)]).unwrap();
        assert_eq!(set.value_at(Timestamp::from_secs(2)), Some(Value::Int(2)));
        assert_eq!(set.value_at(Timestamp::from_secs(3)), None);
    }

    #[test]
    fn test_bbox_covers_all() {
        let set = TInstantSet::new(vec![inst(5, 1), inst(-2, 2), inst(3, 4)]).unwrap();
        let b = set.bounding_box();
        assert_eq!(b.vmin(), -2.0);
        assert_eq!(b.vmax(), 5.0);
        assert_eq!(b.period().lower, Timestamp::from_secs(1));
        assert_eq!(b.period().upper, Timestamp::from_secs(4));
    }
}
