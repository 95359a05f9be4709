//! Merge-state engine: the mergeable accumulator behind window aggregation.
//!
//! A [`MergeState`] folds extension segments into an ordered set of
//! accumulator nodes keyed by timestamp. `transfer` decomposes a segment
//! into its instant boundary points and upserts each in expected O(log n);
//! existing nodes inside the segment's span are reconciled with the
//! segment's interpolated value there, and newly inserted boundary nodes
//! seed from the state's interpolated value, so the projection stays exact.
//! `combine` merges two independently built states over the union of their
//! keys — the operators' commutativity and associativity is what lets an
//! external scheduler build partial states over disjoint partitions and
//! reduce them in any order. `finalize` projects the node runs into an
//! output temporal value and releases the arena in one step.
//!
//! Discontinuities are first-class: a node's `left` limit records a jump on
//! entry, its `right` value records a jump on exit, and an `exclusive` node
//! closes a right-open run without contributing at its own key.

use crate::agg::ops::{AggKind, AggOp};
use crate::agg::skiplist::{Node, SkipList};
use crate::config::Config;
use crate::error::{Result, TemporaError};
use crate::temporal::{Interpolation, TInstant, TSequence, TSequenceSet, Temporal};
use tempora_types::{TimeDelta, Timestamp, Value, ValueType};

/// Running accumulator keyed by time. Created empty on the first
/// transition, mutated only by its owning aggregation pass, and consumed by
/// `finalize`.
#[derive(Debug, Clone)]
pub struct MergeState {
    list: SkipList,
    value_type: ValueType,
    interp: Interpolation,
}

/// One side's reading at a union timestamp: the contribution at the key,
/// the limit approaching it, the value continuing past it, and whether
/// coverage extends beyond it.
#[derive(Debug, Clone, Copy, Default)]
struct Probe {
    at: Option<Value>,
    approach: Option<Value>,
    forward: Option<Value>,
    covers_after: bool,
}

impl MergeState {
    /// Empty state for the given accumulator type and interpolation mode.
    pub fn new(value_type: ValueType, interp: Interpolation, config: &Config) -> Self {
        Self {
            list: SkipList::new(config.skiplist_max_level, config.seed()),
            value_type,
            interp,
        }
    }

    /// Number of accumulator nodes.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// True when no segment has been folded in yet.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Accumulator type carried by the nodes.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Interpolation mode of the folded segments.
    pub fn interpolation(&self) -> Interpolation {
        self.interp
    }

    /// Fold one extension segment into the state.
    ///
    /// All-or-nothing: compatibility is checked before the first mutation,
    /// and nothing after that point can fail, so an error leaves the state
    /// untouched.
    pub fn transfer(&mut self, seq: &TSequence, op: &AggOp) -> Result<()> {
        if seq.value_type() != self.value_type {
            return Err(TemporaError::TypeMismatch {
                expected: self.value_type,
                actual: seq.value_type(),
            });
        }
        if seq.interpolation() != self.interp {
            return Err(TemporaError::Unsupported(format!(
                "cannot fold a {:?} segment into a {:?} state",
                seq.interpolation(),
                self.interp
            )));
        }

        let instants = seq.instants();
        let lower = instants[0].timestamp();
        let upper = instants[instants.len() - 1].timestamp();
        let singleton = instants.len() == 1;

        // Union of the segment's boundary points and the keys already
        // inside its span.
        let mut stamps: Vec<Timestamp> = instants.iter().map(|i| i.timestamp()).collect();
        stamps.extend(self.list.keys_in_range(lower, upper));
        stamps.sort_unstable();
        stamps.dedup();

        // Turning points: where the segment crosses the state between two
        // consecutive stamps, insert the interpolated breakpoint so the
        // extremum keeps its exact piecewise-linear shape.
        if op.crossings && self.interp == Interpolation::Linear && !self.list.is_empty() {
            let mut turning = Vec::new();
            for pair in stamps.windows(2) {
                let (ta, tb) = (pair[0], pair[1]);
                let (Some(fa), Some(fb)) = (self.forward_value(ta), self.approach_value(tb))
                else {
                    continue;
                };
                let da = fa.as_f64() - segment_value(seq, ta).as_f64();
                let db = fb.as_f64() - segment_value(seq, tb).as_f64();
                if da * db < 0.0 {
                    let span = (tb - ta).as_micros() as f64;
                    let tx = ta + TimeDelta::from_micros((span * da / (da - db)).round() as i64);
                    if tx > ta && tx < tb {
                        turning.push(tx);
                    }
                }
            }
            if !turning.is_empty() {
                log::trace!("inserting {} turning points", turning.len());
                stamps.extend(turning);
                stamps.sort_unstable();
                stamps.dedup();
            }
        }

        // Plan phase: every read is against the pre-transfer state.
        struct Plan {
            t: Timestamp,
            existing: Option<u32>,
            state_at: Option<Value>,
            state_app: Option<Value>,
            state_fwd: Option<Value>,
            inherit_linked: bool,
            old_linked: bool,
        }
        let mut plan = Vec::with_capacity(stamps.len());
        for &t in &stamps {
            let existing = self.list.find(t);
            let old_linked = existing.map(|idx| self.list.node(idx).linked).unwrap_or(false);
            let inherit_linked = existing.is_none()
                && self
                    .list
                    .pred(t)
                    .map(|p| self.list.node(p).linked)
                    .unwrap_or(false);
            plan.push(Plan {
                t,
                existing,
                state_at: self.at_value(t),
                state_app: self.approach_value(t),
                state_fwd: self.forward_value(t),
                inherit_linked,
                old_linked,
            });
        }

        // Apply phase: pure arithmetic over pre-read values.
        for item in plan {
            let t = item.t;
            let g = segment_value(seq, t);
            // An exclusive upper bound contributes nothing at its own key;
            // an open lower bound folds in as closed, confining the
            // difference to the single boundary instant.
            let seg_at = (singleton || seq.upper_inc() || t < upper).then_some(g);
            let seg_app = (t > lower).then_some(g);
            let seg_fwd = (t < upper).then_some(g);

            let at = combine_opt(op, item.state_at, seg_at);
            let approach = combine_opt(op, item.state_app, seg_app);
            let forward = combine_opt(op, item.state_fwd, seg_fwd);
            let linked = match item.existing {
                Some(_) => item.old_linked || t < upper,
                None => item.inherit_linked || t < upper,
            };
            let fields = node_fields(self.interp, at, approach, forward, linked);

            match item.existing {
                Some(idx) => {
                    let node = self.list.node_mut(idx);
                    node.acc = fields.acc;
                    node.left = fields.left;
                    node.right = fields.right;
                    node.exclusive = fields.exclusive;
                    node.linked = linked;
                }
                None => {
                    self.list.insert(
                        t,
                        fields.acc,
                        fields.left,
                        fields.right,
                        fields.exclusive,
                        linked,
                    );
                }
            }
        }
        Ok(())
    }

    /// Merge two independently built states.
    ///
    /// Colliding keys combine pairwise through `op`; one-sided keys are
    /// reconciled against the other side's interpolated coverage; coverage
    /// itself is the union. Combining with an empty state is the identity.
    pub fn combine(self, other: MergeState, op: &AggOp) -> Result<MergeState> {
        if self.is_empty() {
            return Ok(other);
        }
        if other.is_empty() {
            return Ok(self);
        }
        if self.value_type != other.value_type {
            return Err(TemporaError::TypeMismatch {
                expected: self.value_type,
                actual: other.value_type,
            });
        }
        if self.interp != other.interp {
            return Err(TemporaError::Unsupported(format!(
                "cannot combine a {:?} state with a {:?} state",
                other.interp, self.interp
            )));
        }

        let interp = self.interp;
        let a_nodes: Vec<&Node> = self.list.iter().collect();
        let b_nodes: Vec<&Node> = other.list.iter().collect();

        // Union walk, probing both sides at every key.
        let mut entries: Vec<(Timestamp, Probe, Probe)> =
            Vec::with_capacity(a_nodes.len() + b_nodes.len());
        let (mut i, mut j) = (0usize, 0usize);
        let (mut prev_a, mut prev_b): (Option<&Node>, Option<&Node>) = (None, None);
        while i < a_nodes.len() || j < b_nodes.len() {
            let t = match (a_nodes.get(i), b_nodes.get(j)) {
                (Some(a), Some(b)) => a.key.min(b.key),
                (Some(a), None) => a.key,
                (None, Some(b)) => b.key,
                (None, None) => unreachable!("loop guard"),
            };
            let pa = probe_side(a_nodes.get(i).copied(), prev_a, t, interp);
            let pb = probe_side(b_nodes.get(j).copied(), prev_b, t, interp);
            if a_nodes.get(i).is_some_and(|n| n.key == t) {
                prev_a = Some(a_nodes[i]);
                i += 1;
            }
            if b_nodes.get(j).is_some_and(|n| n.key == t) {
                prev_b = Some(b_nodes[j]);
                j += 1;
            }
            entries.push((t, pa, pb));
        }

        // Turning points between union keys where both sides cover.
        if op.crossings && interp == Interpolation::Linear {
            let mut expanded = Vec::with_capacity(entries.len());
            for k in 0..entries.len() {
                expanded.push(entries[k]);
                if k + 1 == entries.len() {
                    break;
                }
                let (t1, pa1, pb1) = entries[k];
                let (t2, pa2, pb2) = entries[k + 1];
                let (Some(af), Some(bf)) = (pa1.forward, pb1.forward) else {
                    continue;
                };
                let (Some(aa), Some(ba)) = (pa2.approach, pb2.approach) else {
                    continue;
                };
                let da = af.as_f64() - bf.as_f64();
                let db = aa.as_f64() - ba.as_f64();
                if da * db < 0.0 {
                    let span = (t2 - t1).as_micros() as f64;
                    let frac = da / (da - db);
                    let tx = t1 + TimeDelta::from_micros((span * frac).round() as i64);
                    if tx > t1 && tx < t2 {
                        let va = af.lerp(&aa, frac).unwrap_or(af);
                        let probe = Probe {
                            at: Some(va),
                            approach: Some(va),
                            forward: Some(va),
                            covers_after: true,
                        };
                        expanded.push((tx, probe, probe));
                    }
                }
            }
            entries = expanded;
        }

        let mut list = self.list.spawn_empty();
        for (t, pa, pb) in entries {
            let at = combine_opt(op, pa.at, pb.at);
            let approach = combine_opt(op, pa.approach, pb.approach);
            let forward = combine_opt(op, pa.forward, pb.forward);
            let linked = pa.covers_after || pb.covers_after;
            let fields = node_fields(interp, at, approach, forward, linked);
            list.insert(t, fields.acc, fields.left, fields.right, fields.exclusive, linked);
        }
        Ok(MergeState {
            list,
            value_type: self.value_type,
            interp,
        })
    }

    /// Project the state into an output temporal value, releasing the
    /// arena. An empty state finalizes to `None` — the aggregate's
    /// identity, covering in particular an average of zero contributions.
    pub fn finalize(self, kind: AggKind) -> Result<Option<Temporal>> {
        if self.is_empty() {
            return Ok(None);
        }
        let interp = self.interp;
        let close = |sequences: &mut Vec<TSequence>,
                     run: &mut Vec<TInstant>,
                     lower_inc: &mut bool,
                     upper_inc: bool|
         -> Result<()> {
            let instants = std::mem::take(run);
            debug_assert!(!instants.is_empty());
            sequences.push(TSequence::new(instants, *lower_inc, upper_inc, interp)?);
            *lower_inc = true;
            Ok(())
        };

        let mut sequences: Vec<TSequence> = Vec::new();
        let mut run: Vec<TInstant> = Vec::new();
        let mut run_lower_inc = true;
        for node in self.list.iter() {
            let acc = final_value(kind, node.acc)?;
            if node.exclusive {
                debug_assert!(!node.linked && !run.is_empty());
                run.push(TInstant::new(acc, node.key)?);
                close(&mut sequences, &mut run, &mut run_lower_inc, false)?;
                continue;
            }
            if let Some(left) = node.left {
                // Jump on entry: the previous run closes on its limit.
                if !run.is_empty() {
                    run.push(TInstant::new(final_value(kind, left)?, node.key)?);
                    close(&mut sequences, &mut run, &mut run_lower_inc, false)?;
                }
            }
            run.push(TInstant::new(acc, node.key)?);
            match node.right {
                Some(right) => {
                    // Jump on exit: this key closes inclusively and the
                    // next run opens exclusively on the continuing value.
                    debug_assert!(node.linked);
                    close(&mut sequences, &mut run, &mut run_lower_inc, true)?;
                    run.push(TInstant::new(final_value(kind, right)?, node.key)?);
                    run_lower_inc = false;
                }
                None => {
                    if !node.linked {
                        close(&mut sequences, &mut run, &mut run_lower_inc, true)?;
                    }
                }
            }
        }
        debug_assert!(run.is_empty(), "the final node always closes its run");

        let result = if sequences.len() == 1 {
            Temporal::Sequence(sequences.into_iter().next().expect("one sequence"))
        } else {
            Temporal::SequenceSet(TSequenceSet::new(sequences)?)
        };
        Ok(Some(result))
    }

    /// State value at `t` when a node contributes there or a covered span
    /// strictly contains it.
    fn at_value(&self, t: Timestamp) -> Option<Value> {
        if let Some(idx) = self.list.find(t) {
            let node = self.list.node(idx);
            return (!node.exclusive).then_some(node.acc);
        }
        self.covered_value(t)
    }

    /// Limit of the state approaching `t` from below.
    fn approach_value(&self, t: Timestamp) -> Option<Value> {
        if let Some(idx) = self.list.find(t) {
            let node = self.list.node(idx);
            if node.left.is_some() {
                return node.left;
            }
            if node.exclusive {
                return Some(node.acc);
            }
            let pred_linked = self
                .list
                .pred(t)
                .map(|p| self.list.node(p).linked)
                .unwrap_or(false);
            return pred_linked.then_some(node.acc);
        }
        self.covered_value(t)
    }

    /// State value continuing just past `t`.
    fn forward_value(&self, t: Timestamp) -> Option<Value> {
        if let Some(idx) = self.list.find(t) {
            let node = self.list.node(idx);
            return (node.linked && !node.exclusive)
                .then_some(node.right.unwrap_or(node.acc));
        }
        self.covered_value(t)
    }

    /// Interpolated value strictly inside a covered span; `None` when `t`
    /// falls in a gap or outside the state.
    fn covered_value(&self, t: Timestamp) -> Option<Value> {
        let pred = self.list.pred(t)?;
        let p = self.list.node(pred);
        if !p.linked {
            return None;
        }
        let succ = self.list.next(pred)?;
        let s = self.list.node(succ);
        debug_assert!(p.key < t && t < s.key);
        let from = p.right.unwrap_or(p.acc);
        match self.interp {
            Interpolation::Stepwise => Some(from),
            Interpolation::Linear => {
                let to = s.left.unwrap_or(s.acc);
                let frac =
                    (t - p.key).as_micros() as f64 / (s.key - p.key).as_micros() as f64;
                from.lerp(&to, frac).or(Some(from))
            }
        }
    }
}

/// Resolved node payload derived from the combined readings at a key.
struct NodeFields {
    acc: Value,
    left: Option<Value>,
    right: Option<Value>,
    exclusive: bool,
}

/// Translate combined at/approach/forward readings into node fields. A key
/// with no contribution of its own becomes an exclusive run end holding the
/// approach limit. Jump limits are only materialized where interpolation
/// would otherwise misstate them; under stepwise interpolation the entry
/// side is already carried by the predecessor's forward value.
fn node_fields(
    interp: Interpolation,
    at: Option<Value>,
    approach: Option<Value>,
    forward: Option<Value>,
    linked: bool,
) -> NodeFields {
    match at {
        None => {
            debug_assert!(approach.is_some(), "a keyed node has some reading");
            let limit = approach.or(forward).expect("checked above");
            NodeFields {
                acc: limit,
                left: None,
                right: None,
                exclusive: true,
            }
        }
        Some(acc) => {
            let left = match interp {
                Interpolation::Linear => approach.filter(|l| *l != acc),
                Interpolation::Stepwise => None,
            };
            let right = if linked {
                forward.filter(|f| *f != acc)
            } else {
                None
            };
            NodeFields {
                acc,
                left,
                right,
                exclusive: false,
            }
        }
    }
}

/// Combine two optional readings: both present applies the operator, one
/// present passes through.
fn combine_opt(op: &AggOp, a: Option<Value>, b: Option<Value>) -> Option<Value> {
    match (a, b) {
        (Some(x), Some(y)) => Some(op.apply(&x, &y)),
        (Some(x), None) => Some(x),
        (None, y) => y,
    }
}

/// Segment value at `t`, ignoring bound inclusivity: open bounds still have
/// a limit there, which is what reconciliation needs.
fn segment_value(seq: &TSequence, t: Timestamp) -> Value {
    let instants = seq.instants();
    let idx = instants.partition_point(|inst| inst.timestamp() <= t);
    if idx == 0 {
        return instants[0].value();
    }
    let lower = &instants[idx - 1];
    if lower.timestamp() == t || idx == instants.len() {
        return lower.value();
    }
    match seq.interpolation() {
        Interpolation::Stepwise => lower.value(),
        Interpolation::Linear => {
            let upper = &instants[idx];
            let span = (upper.timestamp() - lower.timestamp()).as_micros() as f64;
            let frac = (t - lower.timestamp()).as_micros() as f64 / span;
            lower
                .value()
                .lerp(&upper.value(), frac)
                .unwrap_or_else(|| lower.value())
        }
    }
}

/// Probe one state side at a union key: either the node at the key itself
/// or the covered span strictly containing it.
fn probe_side(
    next: Option<&Node>,
    prev: Option<&Node>,
    t: Timestamp,
    interp: Interpolation,
) -> Probe {
    if let Some(node) = next.filter(|n| n.key == t) {
        let prev_linked = prev.map(|p| p.linked).unwrap_or(false);
        let approach = if node.left.is_some() {
            node.left
        } else if node.exclusive || prev_linked {
            Some(node.acc)
        } else {
            None
        };
        return Probe {
            at: (!node.exclusive).then_some(node.acc),
            approach,
            forward: (node.linked && !node.exclusive).then_some(node.right.unwrap_or(node.acc)),
            covers_after: node.linked,
        };
    }
    let (Some(p), Some(n)) = (prev, next) else {
        return Probe::default();
    };
    if !p.linked {
        return Probe::default();
    }
    debug_assert!(p.key < t && t < n.key);
    let from = p.right.unwrap_or(p.acc);
    let value = match interp {
        Interpolation::Stepwise => from,
        Interpolation::Linear => {
            let to = n.left.unwrap_or(n.acc);
            let frac = (t - p.key).as_micros() as f64 / (n.key - p.key).as_micros() as f64;
            from.lerp(&to, frac).unwrap_or(from)
        }
    };
    Probe {
        at: Some(value),
        approach: Some(value),
        forward: Some(value),
        covers_after: true,
    }
}

/// Per-node projection at finalize: averages divide their paired
/// accumulator, everything else passes through.
fn final_value(kind: AggKind, value: Value) -> Result<Value> {
    match (kind, value) {
        (AggKind::Avg, Value::SumCount(sc)) => {
            // Every node folds at least one contribution.
            Ok(Value::Float(sc.mean().unwrap_or(0.0)))
        }
        (AggKind::Avg, other) => Err(TemporaError::TypeMismatch {
            expected: ValueType::SumCount,
            actual: other.value_type(),
        }),
        (_, v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finst(v: f64, secs: i64) -> TInstant {
        TInstant::new(Value::Float(v), Timestamp::from_secs(secs)).unwrap()
    }

    fn fseg(points: &[(f64, i64)], lower_inc: bool, upper_inc: bool) -> TSequence {
        TSequence::new(
            points.iter().map(|&(v, s)| finst(v, s)).collect(),
            lower_inc,
            upper_inc,
            Interpolation::Linear,
        )
        .unwrap()
    }

    fn iseg(points: &[(i32, i64)], lower_inc: bool, upper_inc: bool) -> TSequence {
        TSequence::new(
            points
                .iter()
                .map(|&(v, s)| {
                    TInstant::new(Value::Int(v), Timestamp::from_secs(s)).unwrap()
                })
                .collect(),
            lower_inc,
            upper_inc,
            Interpolation::Stepwise,
        )
        .unwrap()
    }

    fn float_state() -> MergeState {
        MergeState::new(ValueType::Float, Interpolation::Linear, &Config::default())
    }

    fn int_state() -> MergeState {
        MergeState::new(ValueType::Int, Interpolation::Stepwise, &Config::default())
    }

    fn min_op() -> AggOp {
        AggKind::Min.resolve(ValueType::Float).unwrap()
    }

    fn sum_op() -> AggOp {
        AggKind::Sum.resolve(ValueType::Int).unwrap()
    }

    fn value_at(temp: &Temporal, secs: i64) -> Option<Value> {
        temp.value_at(Timestamp::from_secs(secs))
    }

    #[test]
    fn test_single_segment_round_trip() {
        let mut state = float_state();
        state
            .transfer(&fseg(&[(7.0, 0), (7.0, 5)], true, false), &min_op())
            .unwrap();
        let out = state.finalize(AggKind::Min).unwrap().unwrap();
        assert_eq!(value_at(&out, 0), Some(Value::Float(7.0)));
        assert_eq!(value_at(&out, 4), Some(Value::Float(7.0)));
        // Right-open end: undefined at the bound itself.
        assert_eq!(value_at(&out, 5), None);
    }

    #[test]
    fn test_overlapping_constants_split_at_run_end() {
        // 3 over [0,5) and 7 over [2,7): the min is 3 until the low run
        // ends, then jumps to 7.
        let mut state = float_state();
        state
            .transfer(&fseg(&[(3.0, 0), (3.0, 5)], true, false), &min_op())
            .unwrap();
        state
            .transfer(&fseg(&[(7.0, 2), (7.0, 7)], true, false), &min_op())
            .unwrap();
        let out = state.finalize(AggKind::Min).unwrap().unwrap();
        assert_eq!(value_at(&out, 1), Some(Value::Float(3.0)));
        assert_eq!(value_at(&out, 4), Some(Value::Float(3.0)));
        assert_eq!(value_at(&out, 5), Some(Value::Float(7.0)));
        assert_eq!(value_at(&out, 6), Some(Value::Float(7.0)));
        assert_eq!(value_at(&out, 7), None);
    }

    #[test]
    fn test_transfer_order_independent() {
        let a = fseg(&[(3.0, 0), (3.0, 5)], true, false);
        let b = fseg(&[(7.0, 2), (7.0, 7)], true, false);

        let mut first = float_state();
        first.transfer(&a, &min_op()).unwrap();
        first.transfer(&b, &min_op()).unwrap();

        let mut second = float_state();
        second.transfer(&b, &min_op()).unwrap();
        second.transfer(&a, &min_op()).unwrap();

        assert_eq!(
            first.finalize(AggKind::Min).unwrap(),
            second.finalize(AggKind::Min).unwrap()
        );
    }

    #[test]
    fn test_combine_matches_transfer() {
        let a = fseg(&[(3.0, 0), (3.0, 5)], true, false);
        let b = fseg(&[(7.0, 2), (7.0, 7)], true, false);

        let mut merged = float_state();
        merged.transfer(&a, &min_op()).unwrap();
        merged.transfer(&b, &min_op()).unwrap();

        let mut left = float_state();
        left.transfer(&a, &min_op()).unwrap();
        let mut right = float_state();
        right.transfer(&b, &min_op()).unwrap();
        let combined = left.combine(right, &min_op()).unwrap();

        assert_eq!(
            merged.finalize(AggKind::Min).unwrap(),
            combined.finalize(AggKind::Min).unwrap()
        );
    }

    #[test]
    fn test_combine_identity() {
        let mut state = float_state();
        state
            .transfer(&fseg(&[(3.0, 0), (3.0, 5)], true, false), &min_op())
            .unwrap();
        let baseline = state.clone().finalize(AggKind::Min).unwrap();

        let combined = state.combine(float_state(), &min_op()).unwrap();
        assert_eq!(combined.finalize(AggKind::Min).unwrap(), baseline);

        let mut state = float_state();
        state
            .transfer(&fseg(&[(3.0, 0), (3.0, 5)], true, false), &min_op())
            .unwrap();
        let combined = float_state().combine(state, &min_op()).unwrap();
        assert_eq!(combined.finalize(AggKind::Min).unwrap(), baseline);
    }

    #[test]
    fn test_combine_associative() {
        let segments = [
            fseg(&[(3.0, 0), (3.0, 5)], true, false),
            fseg(&[(7.0, 2), (7.0, 9)], true, false),
            fseg(&[(1.0, 4), (1.0, 12)], true, false),
        ];
        let state = |i: usize| {
            let mut s = float_state();
            s.transfer(&segments[i], &min_op()).unwrap();
            s
        };

        let left = state(0)
            .combine(state(1), &min_op())
            .unwrap()
            .combine(state(2), &min_op())
            .unwrap();
        let right = state(0)
            .combine(state(1).combine(state(2), &min_op()).unwrap(), &min_op())
            .unwrap();
        assert_eq!(
            left.finalize(AggKind::Min).unwrap(),
            right.finalize(AggKind::Min).unwrap()
        );
    }

    #[test]
    fn test_crossing_inserts_turning_point() {
        // A rising line against a constant: the minimum switches winners
        // where they cross, and the crossing becomes a breakpoint.
        let mut state = float_state();
        state
            .transfer(&fseg(&[(0.0, 0), (10.0, 10)], true, true), &min_op())
            .unwrap();
        state
            .transfer(&fseg(&[(5.0, 3), (5.0, 7)], true, true), &min_op())
            .unwrap();
        let out = state.finalize(AggKind::Min).unwrap().unwrap();
        assert_eq!(value_at(&out, 4), Some(Value::Float(4.0)));
        assert_eq!(value_at(&out, 5), Some(Value::Float(5.0)));
        assert_eq!(value_at(&out, 6), Some(Value::Float(5.0)));
        assert_eq!(value_at(&out, 7), Some(Value::Float(5.0)));
        // Past the constant, the line alone continues.
        assert_eq!(value_at(&out, 8), Some(Value::Float(8.0)));
        assert_eq!(value_at(&out, 10), Some(Value::Float(10.0)));
    }

    #[test]
    fn test_step_sum_overlap() {
        let mut state = int_state();
        state
            .transfer(&iseg(&[(1, 0), (1, 7)], true, false), &sum_op())
            .unwrap();
        state
            .transfer(&iseg(&[(1, 5), (1, 12)], true, true), &sum_op())
            .unwrap();
        let out = state.finalize(AggKind::Sum).unwrap().unwrap();
        assert_eq!(value_at(&out, 4), Some(Value::Int(1)));
        assert_eq!(value_at(&out, 5), Some(Value::Int(2)));
        assert_eq!(value_at(&out, 6), Some(Value::Int(2)));
        // The first segment is open at 7: only the second contributes.
        assert_eq!(value_at(&out, 7), Some(Value::Int(1)));
        assert_eq!(value_at(&out, 12), Some(Value::Int(1)));
    }

    #[test]
    fn test_transfer_rejects_mismatches_untouched() {
        let mut state = float_state();
        state
            .transfer(&fseg(&[(3.0, 0), (3.0, 5)], true, false), &min_op())
            .unwrap();
        let before = state.clone().finalize(AggKind::Min).unwrap();

        // Wrong accumulator type.
        assert!(matches!(
            state.transfer(&iseg(&[(1, 0), (1, 5)], true, false), &min_op()),
            Err(TemporaError::TypeMismatch { .. })
        ));
        // Wrong interpolation mode.
        let step_float = TSequence::new(
            vec![finst(1.0, 0), finst(1.0, 5)],
            true,
            false,
            Interpolation::Stepwise,
        )
        .unwrap();
        assert!(matches!(
            state.transfer(&step_float, &min_op()),
            Err(TemporaError::Unsupported(_))
        ));

        assert_eq!(state.finalize(AggKind::Min).unwrap(), before);
    }

    #[test]
    fn test_empty_state_finalizes_to_identity() {
        assert_eq!(float_state().finalize(AggKind::Min).unwrap(), None);
        let avg_state = MergeState::new(
            ValueType::SumCount,
            Interpolation::Linear,
            &Config::default(),
        );
        // Average of zero contributions yields the identity, not an error.
        assert_eq!(avg_state.finalize(AggKind::Avg).unwrap(), None);
    }
}
