//! Base value types carried by temporal values.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Tag identifying the payload type of a [`Value`].
///
/// The set is fixed and enumerable: 32-bit integers, double-precision floats,
/// and the paired sum/count accumulator used by average aggregation. Spatial
/// base types are registered by external collaborators and are outside this
/// crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Float,
    SumCount,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::SumCount => write!(f, "sum_count"),
        }
    }
}

/// Paired accumulator for average aggregation: a running sum and the number
/// of contributions it folds. Divided only at finalize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SumCount {
    pub sum: f64,
    pub count: i64,
}

impl SumCount {
    /// Accumulator for a single sample.
    pub fn single(value: f64) -> Self {
        Self { sum: value, count: 1 }
    }

    /// Component-wise sum of two accumulators.
    pub fn merge(self, other: SumCount) -> SumCount {
        SumCount {
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }

    /// The average this accumulator represents, or `None` when it holds no
    /// contributions.
    pub fn mean(self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// A base value at one sample.
///
/// # Examples
///
/// ```
/// use tempora_types::{Value, ValueType};
///
/// let v = Value::Int(7);
/// assert_eq!(v.value_type(), ValueType::Int);
/// assert_eq!(v.as_f64(), 7.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Int(i32),
    Float(f64),
    SumCount(SumCount),
}

impl Value {
    /// Type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::SumCount(_) => ValueType::SumCount,
        }
    }

    /// True when every float payload is finite. Integer values are always
    /// finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Int(_) => true,
            Value::Float(v) => v.is_finite(),
            Value::SumCount(sc) => sc.sum.is_finite(),
        }
    }

    /// Numeric projection used by the bounding-box engine. Sum/count
    /// accumulators project their running sum.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Int(v) => f64::from(*v),
            Value::Float(v) => *v,
            Value::SumCount(sc) => sc.sum,
        }
    }

    /// Linear interpolation between two values of the same type at fraction
    /// `frac` in `[0, 1]`. Returns `None` for integer values (integers are
    /// stepwise) and for mismatched types.
    pub fn lerp(&self, other: &Value, frac: f64) -> Option<Value> {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => Some(Value::Float(a + (b - a) * frac)),
            (Value::SumCount(a), Value::SumCount(b)) => Some(Value::SumCount(SumCount {
                sum: a.sum + (b.sum - a.sum) * frac,
                count: a.count + ((b.count - a.count) as f64 * frac).round() as i64,
            })),
            _ => None,
        }
    }

    /// Total order between two values of the same orderable type. Returns
    /// `None` for mismatched types and for sum/count accumulators, which
    /// carry no order.
    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::SumCount(sc) => write!(f, "({}, {})", sc.sum, sc.count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_tags() {
        assert_eq!(Value::Int(1).value_type(), ValueType::Int);
        assert_eq!(Value::Float(1.0).value_type(), ValueType::Float);
        assert_eq!(
            Value::SumCount(SumCount::single(2.0)).value_type(),
            ValueType::SumCount
        );
    }

    #[test]
    fn test_finiteness() {
        assert!(Value::Float(1.5).is_finite());
        assert!(!Value::Float(f64::NAN).is_finite());
        assert!(!Value::Float(f64::INFINITY).is_finite());
        assert!(Value::Int(i32::MAX).is_finite());
    }

    #[test]
    fn test_lerp() {
        let a = Value::Float(10.0);
        let b = Value::Float(20.0);
        assert_eq!(a.lerp(&b, 0.5), Some(Value::Float(15.0)));
        assert_eq!(a.lerp(&b, 0.0), Some(Value::Float(10.0)));

        // Integers are stepwise: no interpolation.
        assert_eq!(Value::Int(1).lerp(&Value::Int(2), 0.5), None);
        // Mismatched types never interpolate.
        assert_eq!(a.lerp(&Value::Int(2), 0.5), None);
    }

    #[test]
    fn test_sum_count_merge_and_mean() {
        let a = SumCount::single(10.0);
        let b = SumCount::single(20.0);
        let merged = a.merge(b);
        assert_eq!(merged.sum, 30.0);
        assert_eq!(merged.count, 2);
        assert_eq!(merged.mean(), Some(15.0));
        assert_eq!(SumCount { sum: 0.0, count: 0 }.mean(), None);
    }

    #[test]
    fn test_cmp_same_type() {
        assert_eq!(
            Value::Int(1).cmp_same_type(&Value::Int(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Float(2.0).cmp_same_type(&Value::Float(2.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Float(2.0)), None);
    }
}
