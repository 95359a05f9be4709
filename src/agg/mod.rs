//! Moving-window aggregation over temporal values.
//!
//! The pipeline: the [window extension engine](window) turns each sample
//! into the segment of time it keeps influencing, and the
//! [merge state](MergeState) folds those segments into a running,
//! mergeable accumulator. [`WindowAgg`] is the opaque pass handle an
//! external dispatch layer holds across repeated transition calls.
//!
//! ```rust
//! use tempora::agg::{AggKind, WindowAgg};
//! use tempora::temporal::{Temporal, TInstant};
//! use tempora_types::{TimeDelta, Timestamp, Value};
//!
//! let mut agg = WindowAgg::new(AggKind::Min, TimeDelta::from_secs(5))?;
//! agg.transfn(&Temporal::Instant(
//!     TInstant::new(Value::Int(7), Timestamp::from_secs(0)).unwrap(),
//! ))?;
//! let out = agg.finalize()?.expect("one sample aggregated");
//! assert_eq!(out.value_at(Timestamp::from_secs(3)), Some(Value::Int(7)));
//! # Ok::<(), tempora::TemporaError>(())
//! ```

pub mod ops;
pub(crate) mod skiplist;
pub mod state;
pub mod window;

pub use ops::{AggKind, AggOp};
pub use state::MergeState;

use crate::config::Config;
use crate::error::{Result, TemporaError};
use crate::temporal::Temporal;
use tempora_types::TimeDelta;

/// A moving-window aggregation pass.
///
/// Holds the aggregate kind, the trailing interval, and the merge state
/// built up by successive [`transfn`](WindowAgg::transfn) calls. Purely
/// synchronous and exclusively owned; two passes built over disjoint
/// inputs can be reduced with [`combine`](WindowAgg::combine) in any
/// order.
#[derive(Debug, Clone)]
pub struct WindowAgg {
    kind: AggKind,
    interval: TimeDelta,
    config: Config,
    state: Option<MergeState>,
}

impl WindowAgg {
    /// New pass with the default configuration. The trailing interval must
    /// be positive.
    pub fn new(kind: AggKind, interval: TimeDelta) -> Result<Self> {
        Self::with_config(kind, interval, Config::default())
    }

    /// New pass with an explicit configuration.
    pub fn with_config(kind: AggKind, interval: TimeDelta, config: Config) -> Result<Self> {
        if !interval.is_positive() {
            return Err(TemporaError::InvalidInput(format!(
                "window interval must be positive, got {}",
                interval
            )));
        }
        config.validate().map_err(TemporaError::InvalidInput)?;
        Ok(Self {
            kind,
            interval,
            config,
            state: None,
        })
    }

    /// The aggregate kind of this pass.
    pub fn kind(&self) -> AggKind {
        self.kind
    }

    /// The trailing interval of this pass.
    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    /// True when no value has been folded in yet.
    pub fn is_empty(&self) -> bool {
        self.state.as_ref().map(MergeState::is_empty).unwrap_or(true)
    }

    /// Transition: extend `temp` by the trailing interval and fold the
    /// resulting segments into the state. Each segment folds atomically.
    pub fn transfn(&mut self, temp: &Temporal) -> Result<()> {
        let segments = window::extend(temp, self.interval, self.kind)?;
        let acc_type = self.kind.accumulator_type(temp.value_type());
        let op = self.kind.resolve(acc_type)?;
        let mut state = match self.state.take() {
            Some(state) => state,
            None => MergeState::new(acc_type, segments[0].interpolation(), &self.config),
        };
        let mut outcome = Ok(());
        for segment in &segments {
            if let Err(err) = state.transfer(segment, &op) {
                outcome = Err(err);
                break;
            }
        }
        self.state = Some(state);
        outcome
    }

    /// Merge another pass into this one. Both passes must aggregate the
    /// same kind; combining with an empty pass is the identity.
    pub fn combine(&mut self, other: WindowAgg) -> Result<()> {
        if other.kind != self.kind {
            return Err(TemporaError::InvalidInput(format!(
                "cannot combine a {} pass into a {} pass",
                other.kind, self.kind
            )));
        }
        // Validate compatibility before consuming either state, so a
        // failure leaves this pass untouched.
        let op = match (self.state.as_ref(), other.state.as_ref()) {
            (Some(a), Some(b)) => {
                if b.value_type() != a.value_type() {
                    return Err(TemporaError::TypeMismatch {
                        expected: a.value_type(),
                        actual: b.value_type(),
                    });
                }
                if b.interpolation() != a.interpolation() {
                    return Err(TemporaError::Unsupported(format!(
                        "cannot combine a {:?} state with a {:?} state",
                        b.interpolation(),
                        a.interpolation()
                    )));
                }
                Some(self.kind.resolve(a.value_type())?)
            }
            _ => None,
        };
        self.state = match (self.state.take(), other.state) {
            (Some(a), Some(b)) => {
                let op = op.expect("resolved above");
                Some(a.combine(b, &op)?)
            }
            (a, b) => a.or(b),
        };
        Ok(())
    }

    /// Finalize the pass into an output temporal value. An empty pass
    /// yields `None`.
    pub fn finalize(self) -> Result<Option<Temporal>> {
        match self.state {
            None => Ok(None),
            Some(state) => state.finalize(self.kind),
        }
    }
}
