//! Error types for Tempora operations.

use tempora_types::ValueType;
use thiserror::Error;

/// Errors surfaced by temporal value construction and aggregation.
#[derive(Error, Debug)]
pub enum TemporaError {
    /// A constructor rejected its input. No partial value exists after this
    /// error.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested operation is not defined for the given value shape,
    /// e.g. windowed sum over linearly-interpolated float sequences.
    #[error("operation not supported: {0}")]
    Unsupported(String),

    /// Two operands of incompatible base types met in an aggregation.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },

    /// A caller-supplied argument was out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A timestamp could not be interpreted.
    #[error("invalid timestamp")]
    InvalidTimestamp,

    /// Encoding or decoding the binary value layout failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, TemporaError>;
