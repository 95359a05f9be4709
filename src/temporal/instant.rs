//! Temporal instant: one value at one timestamp.

use crate::error::{Result, TemporaError};
use crate::tbox::TBox;
use serde::{Deserialize, Serialize};
use tempora_types::{Period, Timestamp, Value, ValueType};

/// A single sample: a base value paired with its timestamp. Immutable.
///
/// # Examples
///
/// ```
/// use tempora::temporal::TInstant;
/// use tempora_types::{Timestamp, Value};
///
/// let inst = TInstant::new(Value::Float(1.5), Timestamp::from_secs(10)).unwrap();
/// assert_eq!(inst.value(), Value::Float(1.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TInstant {
    value: Value,
    t: Timestamp,
}

impl TInstant {
    /// Create an instant. Float payloads must be finite.
    pub fn new(value: Value, t: Timestamp) -> Result<Self> {
        if !value.is_finite() {
            return Err(TemporaError::Validation(format!(
                "instant value must be finite, got {}",
                value
            )));
        }
        Ok(Self { value, t })
    }

    /// The sampled value.
    pub fn value(&self) -> Value {
        self.value
    }

    /// The sample timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.t
    }

    /// Type tag of the sampled value.
    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    /// Value at `t`: the sample itself at its own timestamp, nothing
    /// elsewhere.
    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        (t == self.t).then_some(self.value)
    }

    /// Degenerate period covering the sample timestamp.
    pub fn time_span(&self) -> Period {
        Period::at(self.t)
    }

    /// Bounding box, degenerate on both dimensions. Instants carry no stored
    /// box; it is recomputed on demand.
    pub fn bounding_box(&self) -> TBox {
        TBox::from_instant(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_non_finite() {
        assert!(TInstant::new(Value::Float(f64::NAN), Timestamp::from_secs(0)).is_err());
        assert!(TInstant::new(Value::Float(1.0), Timestamp::from_secs(0)).is_ok());
    }

    #[test]
    fn test_value_at() {
        let inst = TInstant::new(Value::Int(4), Timestamp::from_secs(3)).unwrap();
        assert_eq!(inst.value_at(Timestamp::from_secs(3)), Some(Value::Int(4)));
        assert_eq!(inst.value_at(Timestamp::from_secs(4)), None);
    }
}
