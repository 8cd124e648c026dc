//! Installer error types.

use thiserror::Error;

/// Errors raised by a module loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// No library with this package name is known to the loader.
    #[error("unknown library package: {0}")]
    UnknownPackage(String),

    /// The package exists but could not be installed.
    #[error("failed to install {package}: {message}")]
    InstallFailed {
        /// Package name.
        package: String,
        /// Failure description.
        message: String,
    },
}

/// Errors raised while building or resolving an installer.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The generator graph is deeper than the configured limit.
    #[error("maximum recursion depth ({depth}) reached during installer resolution")]
    MaxRecursionDepthExceeded {
        /// Depth at which resolution stopped.
        depth: u32,
    },

    /// Loading library packages failed.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// A generator returned an error.
    #[error("generator '{name}' failed: {message}")]
    Generator {
        /// Generator name.
        name: String,
        /// Failure description.
        message: String,
    },

    /// An installer script could not be parsed.
    #[error("invalid installer script: {0}")]
    Script(String),
}

/// Result type for installer operations.
pub type InstallerResult<T> = Result<T, InstallerError>;
