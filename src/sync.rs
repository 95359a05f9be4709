//! Thread-shareable aggregation pass.
//!
//! The core is purely synchronous and a [`WindowAgg`] is exclusively owned
//! by its caller. For callers that must feed one pass from several threads,
//! this wrapper provides the external synchronization the core itself does
//! not: a mutex around the pass. Prefer building one pass per partition and
//! reducing with [`WindowAgg::combine`]; that is what the operators'
//! algebra is for.

use crate::agg::{AggKind, WindowAgg};
use crate::error::Result;
use crate::temporal::Temporal;
use parking_lot::Mutex;
use std::sync::Arc;
use tempora_types::TimeDelta;

/// A cloneable, thread-safe handle to a shared aggregation pass.
#[derive(Clone)]
pub struct SyncWindowAgg {
    inner: Arc<Mutex<WindowAgg>>,
}

impl SyncWindowAgg {
    /// New shared pass. The trailing interval must be positive.
    pub fn new(kind: AggKind, interval: TimeDelta) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(WindowAgg::new(kind, interval)?)),
        })
    }

    /// Wrap an existing pass.
    pub fn from_agg(agg: WindowAgg) -> Self {
        Self {
            inner: Arc::new(Mutex::new(agg)),
        }
    }

    /// Fold a temporal value into the shared state.
    pub fn transfn(&self, temp: &Temporal) -> Result<()> {
        self.inner.lock().transfn(temp)
    }

    /// Merge an independently built pass into the shared state.
    pub fn combine(&self, other: WindowAgg) -> Result<()> {
        self.inner.lock().combine(other)
    }

    /// Finalize a snapshot of the shared state. The shared pass itself
    /// keeps accepting transitions.
    pub fn finalize(&self) -> Result<Option<Temporal>> {
        self.inner.lock().clone().finalize()
    }
}
