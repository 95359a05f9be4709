//! Aggregate operator table.
//!
//! A static registry maps `(kind, accumulator type)` to an operator
//! descriptor. Every registered operator is commutative and associative —
//! the property `MergeState::combine` relies on to let callers fold
//! partial states over independent row subsets in any order.

use crate::error::{Result, TemporaError};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tempora_types::{Value, ValueType};

/// The window aggregate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggKind {
    Min,
    Max,
    Sum,
    Count,
    Avg,
}

impl AggKind {
    /// Accumulator type used for an input base type: count folds integer
    /// contribution counts, avg folds paired sum/count accumulators, the
    /// rest accumulate in the input type.
    pub fn accumulator_type(self, input: ValueType) -> ValueType {
        match self {
            AggKind::Count => ValueType::Int,
            AggKind::Avg => ValueType::SumCount,
            AggKind::Min | AggKind::Max | AggKind::Sum => input,
        }
    }

    /// Look up the operator descriptor for an accumulator type.
    pub fn resolve(self, acc_type: ValueType) -> Result<AggOp> {
        OPERATORS
            .get(&(self, acc_type))
            .copied()
            .ok_or_else(|| {
                TemporaError::Unsupported(format!(
                    "no {} operator is registered for {} accumulators",
                    self, acc_type
                ))
            })
    }
}

impl fmt::Display for AggKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggKind::Min => write!(f, "min"),
            AggKind::Max => write!(f, "max"),
            AggKind::Sum => write!(f, "sum"),
            AggKind::Count => write!(f, "count"),
            AggKind::Avg => write!(f, "avg"),
        }
    }
}

type ApplyFn = fn(&Value, &Value) -> Value;

/// A registered binary aggregate operator.
///
/// `crossings` marks operators whose merge inserts an interpolated
/// breakpoint where two linear pieces cross (the extrema); `extend_min`
/// picks the window-extension shape for linear segments (whether the
/// smaller or the larger endpoint dominates the trailing window).
#[derive(Debug, Clone, Copy)]
pub struct AggOp {
    pub kind: AggKind,
    pub acc_type: ValueType,
    pub crossings: bool,
    pub extend_min: bool,
    apply: ApplyFn,
}

impl AggOp {
    /// Apply the operator. Operands must carry the registered accumulator
    /// type; the merge state checks compatibility before any application.
    pub fn apply(&self, a: &Value, b: &Value) -> Value {
        (self.apply)(a, b)
    }
}

fn min_int(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int((*x).min(*y)),
        _ => unreachable!("operator registered for int accumulators"),
    }
}

fn max_int(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int((*x).max(*y)),
        _ => unreachable!("operator registered for int accumulators"),
    }
}

fn sum_int(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_add(*y)),
        _ => unreachable!("operator registered for int accumulators"),
    }
}

fn min_float(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Value::Float(x.min(*y)),
        _ => unreachable!("operator registered for float accumulators"),
    }
}

fn max_float(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Value::Float(x.max(*y)),
        _ => unreachable!("operator registered for float accumulators"),
    }
}

fn sum_float(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Value::Float(x + y),
        _ => unreachable!("operator registered for float accumulators"),
    }
}

fn sum_pair(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::SumCount(x), Value::SumCount(y)) => Value::SumCount(x.merge(*y)),
        _ => unreachable!("operator registered for sum/count accumulators"),
    }
}

static OPERATORS: Lazy<FxHashMap<(AggKind, ValueType), AggOp>> = Lazy::new(|| {
    let mut table = FxHashMap::default();
    let mut register =
        |kind: AggKind, acc_type: ValueType, crossings: bool, extend_min: bool, apply: ApplyFn| {
            table.insert(
                (kind, acc_type),
                AggOp {
                    kind,
                    acc_type,
                    crossings,
                    extend_min,
                    apply,
                },
            );
        };

    register(AggKind::Min, ValueType::Int, true, true, min_int);
    register(AggKind::Min, ValueType::Float, true, true, min_float);
    register(AggKind::Max, ValueType::Int, true, false, max_int);
    register(AggKind::Max, ValueType::Float, true, false, max_float);
    register(AggKind::Sum, ValueType::Int, false, true, sum_int);
    register(AggKind::Sum, ValueType::Float, false, true, sum_float);
    // Count folds integer 1s regardless of the input type.
    register(AggKind::Count, ValueType::Int, false, true, sum_int);
    // Avg folds paired accumulators, divided only at finalize.
    register(AggKind::Avg, ValueType::SumCount, false, true, sum_pair);
    table
});

#[cfg(test)]
mod tests {
    use super::*;
    use tempora_types::SumCount;

    #[test]
    fn test_accumulator_types() {
        assert_eq!(AggKind::Min.accumulator_type(ValueType::Float), ValueType::Float);
        assert_eq!(AggKind::Count.accumulator_type(ValueType::Float), ValueType::Int);
        assert_eq!(AggKind::Avg.accumulator_type(ValueType::Int), ValueType::SumCount);
    }

    #[test]
    fn test_resolve_unregistered() {
        assert!(AggKind::Min.resolve(ValueType::SumCount).is_err());
        assert!(AggKind::Avg.resolve(ValueType::Float).is_err());
        assert!(AggKind::Avg.resolve(ValueType::SumCount).is_ok());
    }

    #[test]
    fn test_operators_commute() {
        let cases = [
            (AggKind::Min, Value::Int(3), Value::Int(7)),
            (AggKind::Max, Value::Int(3), Value::Int(7)),
            (AggKind::Sum, Value::Int(3), Value::Int(7)),
        ];
        for (kind, a, b) in cases {
            let op = kind.resolve(ValueType::Int).unwrap();
            assert_eq!(op.apply(&a, &b), op.apply(&b, &a));
        }

        let op = AggKind::Avg.resolve(ValueType::SumCount).unwrap();
        let a = Value::SumCount(SumCount::single(10.0));
        let b = Value::SumCount(SumCount::single(4.0));
        assert_eq!(op.apply(&a, &b), op.apply(&b, &a));
    }

    #[test]
    fn test_operators_associate() {
        let op = AggKind::Sum.resolve(ValueType::Float).unwrap();
        let (a, b, c) = (Value::Float(1.5), Value::Float(2.5), Value::Float(4.0));
        assert_eq!(
            op.apply(&op.apply(&a, &b), &c),
            op.apply(&a, &op.apply(&b, &c))
        );
    }

    #[test]
    fn test_crossings_flags() {
        assert!(AggKind::Min.resolve(ValueType::Float).unwrap().crossings);
        assert!(AggKind::Max.resolve(ValueType::Int).unwrap().crossings);
        assert!(!AggKind::Sum.resolve(ValueType::Int).unwrap().crossings);
        assert!(!AggKind::Count.resolve(ValueType::Int).unwrap().crossings);
        assert!(!AggKind::Avg.resolve(ValueType::SumCount).unwrap().crossings);
    }
}
