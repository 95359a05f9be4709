//! # tempora-types
//!
//! Core value and time types for the Tempora temporal algebra.
//!
//! This crate provides the fundamental types temporal values are built from:
//!
//! - **Value types**: [`Value`], [`ValueType`], [`SumCount`]
//! - **Time types**: [`Timestamp`], [`TimeDelta`], [`Period`]
//!
//! All types are serializable with Serde and carry microsecond resolution on
//! the time axis.
//!
//! ## Examples
//!
//! ```rust
//! use tempora_types::{Timestamp, TimeDelta, Value};
//!
//! let t = Timestamp::from_secs(10);
//! let later = t + TimeDelta::from_secs(5);
//! assert_eq!(later.as_micros() - t.as_micros(), 5_000_000);
//!
//! let v = Value::Float(3.5);
//! assert!(v.is_finite());
//! ```

pub mod time;
pub mod value;

pub use time::{Period, TimeDelta, Timestamp};
pub use value::{SumCount, Value, ValueType};
