//! Platform error types.

use canopy_core::InstanceId;
use thiserror::Error;

/// Errors raised by the application registry and its hosts.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// No running instance has this id.
    #[error("unknown application instance: {0}")]
    UnknownInstance(InstanceId),

    /// A top-level browsing context could not be opened.
    #[error("failed to open {url}: {message}")]
    Launch {
        /// The URL that was being opened.
        url: String,
        /// Host-reported reason.
        message: String,
    },

    /// The frame host failed to release an instance's frame.
    #[error("frame host error: {0}")]
    Frame(String),
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
