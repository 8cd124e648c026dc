//! Storage error types.

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A storage operation failed.
    #[error("storage error: {0}")]
    Internal(String),

    /// The remote service could not be reached or answered with an error.
    #[error("transport error: {message}")]
    Transport {
        /// Status reported by the service, if any.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The package or data name is invalid.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    /// Status code carried by a transport error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
