//! Temporal sequence set: an ordered union of disjoint sequences.

use crate::error::{Result, TemporaError};
use crate::tbox::TBox;
use crate::temporal::{Interpolation, TInstant, TSequence};
use serde::{Deserialize, Serialize};
use tempora_types::{Period, TimeDelta, Timestamp, Value, ValueType};

/// Time-sorted, pairwise non-overlapping sequences sharing one value type
/// and one interpolation mode. Adjacent sequences may touch only where
/// bound exclusivity prevents them from sharing an instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TSequenceSet {
    sequences: Vec<TSequence>,
    interp: Interpolation,
    bbox: TBox,
}

impl TSequenceSet {
    /// Build from validated component sequences. Fails atomically.
    pub fn new(sequences: Vec<TSequence>) -> Result<Self> {
        if sequences.is_empty() {
            return Err(TemporaError::Validation(
                "a sequence set requires at least one sequence".to_string(),
            ));
        }
        let interp = sequences[0].interpolation();
        let value_type = sequences[0].value_type();
        for seq in &sequences[1..] {
            if seq.interpolation() != interp {
                return Err(TemporaError::Validation(
                    "all sequences in a set share one interpolation mode".to_string(),
                ));
            }
            if seq.value_type() != value_type {
                return Err(TemporaError::TypeMismatch {
                    expected: value_type,
                    actual: seq.value_type(),
                });
            }
        }
        for pair in sequences.windows(2) {
            let (a, b) = (pair[0].time_span(), pair[1].time_span());
            let ordered = a.upper < b.lower
                || (a.upper == b.lower && !(a.upper_inc && b.lower_inc));
            if !ordered {
                return Err(TemporaError::Validation(format!(
                    "sequences must be time-ordered and disjoint, got {} before {}",
                    a, b
                )));
            }
        }
        let mut bbox = sequences[0].bounding_box();
        for seq in &sequences[1..] {
            bbox.expand(&seq.bounding_box());
        }
        Ok(Self {
            sequences,
            interp,
            bbox,
        })
    }

    /// The ordered component sequences.
    pub fn sequences(&self) -> &[TSequence] {
        &self.sequences
    }

    /// Number of component sequences.
    pub fn num_sequences(&self) -> usize {
        self.sequences.len()
    }

    /// Total number of samples across all components.
    pub fn num_instants(&self) -> usize {
        self.sequences.iter().map(TSequence::num_instants).sum()
    }

    /// Sample at flattened position `i` across the components.
    pub fn instant_at(&self, mut i: usize) -> Option<&TInstant> {
        for seq in &self.sequences {
            if i < seq.num_instants() {
                return seq.instant_at(i);
            }
            i -= seq.num_instants();
        }
        None
    }

    /// Shared interpolation mode.
    pub fn interpolation(&self) -> Interpolation {
        self.interp
    }

    /// Type tag of the sampled values.
    pub fn value_type(&self) -> ValueType {
        self.sequences[0].value_type()
    }

    /// Value at `t`, delegated to the component covering it.
    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        // First component whose upper bound is at or past t.
        let idx = self
            .sequences
            .partition_point(|seq| seq.time_span().upper < t);
        self.sequences.get(idx).and_then(|seq| seq.value_at(t))
    }

    /// Period from the first component's lower bound to the last
    /// component's upper bound. Gaps are not represented here.
    pub fn time_span(&self) -> Period {
        let first = self.sequences[0].time_span();
        let last = self.sequences[self.sequences.len() - 1].time_span();
        Period::new(first.lower, last.upper, first.lower_inc, last.upper_inc)
    }

    /// Summed duration of the component sequences, gaps excluded.
    pub fn duration(&self) -> TimeDelta {
        self.sequences
            .iter()
            .fold(TimeDelta::ZERO, |acc, seq| acc + seq.duration())
    }

    /// Bounding box covering every component.
    pub fn bounding_box(&self) -> TBox {
        self.bbox
    }

    /// Extend the final sequence by one instant, growing both its box and
    /// the set's box in place.
    pub fn append(&mut self, value: Value, t: Timestamp) -> Result<()> {
        let last = self
            .sequences
            .last_mut()
            .expect("validated sets are non-empty");
        last.append(value, t)?;
        self.bbox.expand(&last.bounding_box());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fseq(points: &[(f64, i64)], lower_inc: bool, upper_inc: bool) -> TSequence {
        TSequence::new(
            points
                .iter()
                .map(|&(v, s)| TInstant::new(Value::Float(v), Timestamp::from_secs(s)).unwrap())
                .collect(),
            lower_inc,
            upper_inc,
            Interpolation::Linear,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_overlap() {
        let a = fseq(&[(1.0, 0), (2.0, 10)], true, true);
        let b = fseq(&[(3.0, 5), (4.0, 15)], true, true);
        assert!(TSequenceSet::new(vec![a, b]).is_err());
    }

    #[test]
    fn test_new_allows_exclusive_adjacency() {
        let a = fseq(&[(1.0, 0), (2.0, 10)], true, false);
        let b = fseq(&[(3.0, 10), (4.0, 15)], true, true);
        assert!(TSequenceSet::new(vec![a.clone(), b.clone()]).is_ok());

        // Both inclusive at the junction would share the instant.
        let a_closed = fseq(&[(1.0, 0), (2.0, 10)], true, true);
        assert!(TSequenceSet::new(vec![a_closed, b]).is_err());
    }

    #[test]
    fn test_value_at_spans_gaps() {
        let set = TSequenceSet::new(vec![
            fseq(&[(1.0, 0), (2.0, 10)], true, true),
            fseq(&[(5.0, 20), (6.0, 30)], true, true),
        ])
        .unwrap();
        assert_eq!(set.value_at(Timestamp::from_secs(5)), Some(Value::Float(1.5)));
        assert_eq!(set.value_at(Timestamp::from_secs(15)), None);
        assert_eq!(set.value_at(Timestamp::from_secs(20)), Some(Value::Float(5.0)));
    }

    #[test]
    fn test_append_goes_to_last_sequence() {
        let mut set = TSequenceSet::new(vec![
            fseq(&[(1.0, 0), (2.0, 10)], true, true),
            fseq(&[(5.0, 20), (6.0, 30)], true, true),
        ])
        .unwrap();
        let old_box = set.bounding_box();
        set.append(Value::Float(9.0), Timestamp::from_secs(40)).unwrap();
        assert_eq!(set.sequences()[1].num_instants(), 3);
        assert!(set.bounding_box().contains(&old_box));
        assert_eq!(set.bounding_box().vmax(), 9.0);
    }

    #[test]
    fn test_duration_excludes_gaps() {
        let set = TSequenceSet::new(vec![
            fseq(&[(1.0, 0), (2.0, 10)], true, true),
            fseq(&[(5.0, 20), (6.0, 30)], true, true),
        ])
        .unwrap();
        assert_eq!(set.duration(), TimeDelta::from_secs(20));
        assert_eq!(set.time_span().duration(), TimeDelta::from_secs(30));
    }
}
