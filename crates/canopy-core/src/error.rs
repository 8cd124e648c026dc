//! Core error types.

use thiserror::Error;

/// Errors raised by core type conversions.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An instance identifier could not be parsed.
    #[error("invalid instance id '{value}': {reason}")]
    InvalidInstanceId {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
