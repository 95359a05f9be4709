//! Window extension engine.
//!
//! Pure, stateless transform: given a temporal value and a trailing
//! duration, emit the short-lived segments over which each sample keeps
//! influencing a moving aggregate. Dispatch is by variant and
//! interpolation; every case emits O(count) segments, which the merge
//! state folds immediately.

use crate::agg::ops::AggKind;
use crate::error::{Result, TemporaError};
use crate::temporal::{Interpolation, TInstant, TSequence, Temporal};
use std::cmp::Ordering;
use tempora_types::{SumCount, TimeDelta, Value, ValueType};

/// Extend `temp` by the trailing interval for the given aggregate kind.
pub fn extend(temp: &Temporal, interval: TimeDelta, kind: AggKind) -> Result<Vec<TSequence>> {
    if !interval.is_positive() {
        return Err(TemporaError::InvalidInput(format!(
            "window interval must be positive, got {}",
            interval
        )));
    }
    check_supported(temp, kind)?;
    let segments = match kind {
        AggKind::Min => extend_value(temp, interval, true)?,
        AggKind::Max => extend_value(temp, interval, false)?,
        // The extension shape flag is irrelevant for sum: linear float
        // sequences are rejected above and integer sequences are stepwise.
        AggKind::Sum => extend_value(temp, interval, true)?,
        AggKind::Count => transform_count(temp, interval)?,
        AggKind::Avg => transform_avg(temp, interval)?,
    };
    log::debug!(
        "extended {} instants into {} window segments for {}",
        temp.num_instants(),
        segments.len(),
        kind
    );
    Ok(segments)
}

/// Reject shape/operator pairs with no exact windowed semantics.
fn check_supported(temp: &Temporal, kind: AggKind) -> Result<()> {
    let value_type = temp.value_type();
    if value_type == ValueType::SumCount && kind != AggKind::Count {
        return Err(TemporaError::Unsupported(format!(
            "windowed {} is not defined over sum/count accumulator values",
            kind
        )));
    }
    let continuous = matches!(temp, Temporal::Sequence(_) | Temporal::SequenceSet(_))
        && temp.interpolation() == Interpolation::Linear;
    if continuous
        && value_type == ValueType::Float
        && matches!(kind, AggKind::Sum | AggKind::Avg)
    {
        return Err(TemporaError::Unsupported(format!(
            "windowed {} is not supported for linearly-interpolated float sequences",
            kind
        )));
    }
    Ok(())
}

/// Min/max/sum extension: each sample's value holds for the trailing
/// interval past the sample (or past the pair it opens).
fn extend_value(temp: &Temporal, interval: TimeDelta, min: bool) -> Result<Vec<TSequence>> {
    match temp {
        Temporal::Instant(inst) => Ok(vec![extend_instant(inst, interval)?]),
        Temporal::InstantSet(set) => set
            .instants()
            .iter()
            .map(|inst| extend_instant(inst, interval))
            .collect(),
        Temporal::Sequence(seq) => extend_sequence(seq, interval, min),
        Temporal::SequenceSet(set) => {
            let mut out = Vec::with_capacity(set.num_instants());
            for seq in set.sequences() {
                out.append(&mut extend_sequence(seq, interval, min)?);
            }
            Ok(out)
        }
    }
}

/// One right-open segment holding the instant's value over `[t, t+I)`.
fn extend_instant(inst: &TInstant, interval: TimeDelta) -> Result<TSequence> {
    let upper = TInstant::new(inst.value(), inst.timestamp() + interval)?;
    TSequence::new(
        vec![*inst, upper],
        true,
        false,
        Interpolation::default_for(inst.value_type()),
    )
}

fn extend_sequence(seq: &TSequence, interval: TimeDelta, min: bool) -> Result<Vec<TSequence>> {
    if seq.num_instants() == 1 {
        return Ok(vec![extend_instant(seq.start_instant(), interval)?]);
    }
    match seq.interpolation() {
        Interpolation::Stepwise => extend_step_sequence(seq, interval),
        Interpolation::Linear => extend_linear_sequence(seq, interval, min),
    }
}

/// Stepwise: each consecutive pair holds the earlier value until the later
/// sample ages out of the window. Inner boundaries are closed on entry and
/// open on exit; the outer bounds honor the sequence's own inclusivity.
fn extend_step_sequence(seq: &TSequence, interval: TimeDelta) -> Result<Vec<TSequence>> {
    let instants = seq.instants();
    let mut out = Vec::with_capacity(instants.len() - 1);
    let mut lower_inc = seq.lower_inc();
    for (i, pair) in instants.windows(2).enumerate() {
        let upper_inc = if i + 2 == instants.len() {
            seq.upper_inc()
        } else {
            false
        };
        let held = TInstant::new(pair[0].value(), pair[1].timestamp() + interval)?;
        out.push(TSequence::new(
            vec![pair[0], held],
            lower_inc,
            upper_inc,
            Interpolation::Stepwise,
        )?);
        lower_inc = true;
    }
    Ok(out)
}

/// Linear: per consecutive pair, three cases. A constant pair extends like
/// the stepwise case. When the earlier value dominates the trailing window
/// (increasing pair under min, decreasing under max), it holds until its
/// window ages out, then transitions linearly: `v1@t1, v1@(t1+I),
/// v2@(t2+I)`. Otherwise the transition itself stays exact and the later
/// value holds past the pair: `v1@t1, v2@t2, v2@(t2+I)`. These are the
/// minimal breakpoints that keep downstream aggregation exact.
fn extend_linear_sequence(
    seq: &TSequence,
    interval: TimeDelta,
    min: bool,
) -> Result<Vec<TSequence>> {
    let instants = seq.instants();
    let mut out = Vec::with_capacity(instants.len() - 1);
    let mut lower_inc = seq.lower_inc();
    for (i, pair) in instants.windows(2).enumerate() {
        let upper_inc = if i + 2 == instants.len() {
            seq.upper_inc()
        } else {
            false
        };
        let (first, second) = (pair[0], pair[1]);
        let v1 = first.value();
        let v2 = second.value();
        let points = match v1.cmp_same_type(&v2) {
            Some(Ordering::Equal) => vec![
                first,
                TInstant::new(v1, second.timestamp() + interval)?,
            ],
            Some(ord)
                if (ord == Ordering::Less && min) || (ord == Ordering::Greater && !min) =>
            {
                vec![
                    first,
                    TInstant::new(v1, first.timestamp() + interval)?,
                    TInstant::new(v2, second.timestamp() + interval)?,
                ]
            }
            Some(_) => vec![
                first,
                second,
                TInstant::new(v2, second.timestamp() + interval)?,
            ],
            None => unreachable!("extension inputs are validated to be orderable"),
        };
        out.push(TSequence::new(
            points,
            lower_inc,
            upper_inc,
            Interpolation::Linear,
        )?);
        lower_inc = true;
    }
    Ok(out)
}

/// Count transform: every sample contributes an integer 1 over its window
/// of influence; stepwise segments, same boundary pattern as the value
/// extension.
fn transform_count(temp: &Temporal, interval: TimeDelta) -> Result<Vec<TSequence>> {
    transform_constant(temp, interval, |_| Value::Int(1), Interpolation::Stepwise)
}

/// Avg transform: every sample becomes a paired `(sum, 1)` accumulator held
/// constant over its window of influence.
fn transform_avg(temp: &Temporal, interval: TimeDelta) -> Result<Vec<TSequence>> {
    transform_constant(
        temp,
        interval,
        |v| Value::SumCount(SumCount::single(v.as_f64())),
        Interpolation::Linear,
    )
}

/// Shared shape for the count/avg transforms: per sample (or per pair for
/// sequences), a constant segment carrying `project(value)`.
fn transform_constant(
    temp: &Temporal,
    interval: TimeDelta,
    project: fn(&Value) -> Value,
    interp: Interpolation,
) -> Result<Vec<TSequence>> {
    let constant_pair = |value: &Value, lower: &TInstant, upper_t, lower_inc, upper_inc| {
        let v = project(value);
        let points = vec![
            TInstant::new(v, lower.timestamp())?,
            TInstant::new(v, upper_t)?,
        ];
        TSequence::new(points, lower_inc, upper_inc, interp)
    };
    let single = |inst: &TInstant| {
        constant_pair(&inst.value(), inst, inst.timestamp() + interval, true, false)
    };
    let sequence = |seq: &TSequence| -> Result<Vec<TSequence>> {
        if seq.num_instants() == 1 {
            return Ok(vec![single(seq.start_instant())?]);
        }
        let instants = seq.instants();
        let mut out = Vec::with_capacity(instants.len() - 1);
        let mut lower_inc = seq.lower_inc();
        for (i, pair) in instants.windows(2).enumerate() {
            let upper_inc = if i + 2 == instants.len() {
                seq.upper_inc()
            } else {
                false
            };
            out.push(constant_pair(
                &pair[0].value(),
                &pair[0],
                pair[1].timestamp() + interval,
                lower_inc,
                upper_inc,
            )?);
            lower_inc = true;
        }
        Ok(out)
    };
    match temp {
        Temporal::Instant(inst) => Ok(vec![single(inst)?]),
        Temporal::InstantSet(set) => set.instants().iter().map(|inst| single(inst)).collect(),
        Temporal::Sequence(seq) => sequence(seq),
        Temporal::SequenceSet(set) => {
            let mut out = Vec::with_capacity(set.num_instants());
            for seq in set.sequences() {
                out.append(&mut sequence(seq)?);
            }
            Ok(out)
        }
    }
}
