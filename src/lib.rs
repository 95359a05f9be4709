//! Temporal value algebra with bounding-box pruning and moving-window
//! aggregation.
//!
//! ```rust
//! use tempora::agg::{AggKind, WindowAgg};
//! use tempora::temporal::{Interpolation, TInstant, TSequence, Temporal};
//! use tempora_types::{TimeDelta, Timestamp, Value};
//!
//! let seq = TSequence::new(
//!     vec![
//!         TInstant::new(Value::Float(10.0), Timestamp::from_secs(0)).unwrap(),
//!         TInstant::new(Value::Float(20.0), Timestamp::from_secs(10)).unwrap(),
//!     ],
//!     true,
//!     true,
//!     Interpolation::Linear,
//! )?;
//!
//! let mut agg = WindowAgg::new(AggKind::Min, TimeDelta::from_secs(5))?;
//! agg.transfn(&Temporal::Sequence(seq))?;
//! let out = agg.finalize()?.expect("non-empty pass");
//!
//! // The windowed minimum holds at 10 until the low sample ages out.
//! assert_eq!(out.value_at(Timestamp::from_secs(5)), Some(Value::Float(10.0)));
//! # Ok::<(), tempora::TemporaError>(())
//! ```

pub mod agg;
pub mod codec;
pub mod config;
pub mod error;
pub mod tbox;
pub mod temporal;

#[cfg(feature = "sync")]
pub mod sync;

pub use config::Config;
pub use error::{Result, TemporaError};

pub use agg::{AggKind, MergeState, WindowAgg};
pub use tbox::TBox;
pub use temporal::{Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal};

pub use tempora_types::{Period, SumCount, TimeDelta, Timestamp, Value, ValueType};

#[cfg(feature = "sync")]
pub use sync::SyncWindowAgg;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Config, Result, TemporaError};

    pub use crate::agg::{AggKind, MergeState, WindowAgg};

    pub use crate::tbox::TBox;

    pub use crate::temporal::{
        Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal,
    };

    pub use tempora_types::{Period, SumCount, TimeDelta, Timestamp, Value, ValueType};

    #[cfg(feature = "sync")]
    pub use crate::SyncWindowAgg;
}
