//! Shell error types.

use thiserror::Error;

use canopy_config::ConfigError;
use canopy_favorites::FavoritesError;
use canopy_installer::InstallerError;
use canopy_platform::PlatformError;
use canopy_storage::StorageError;
use canopy_telemetry::TelemetryError;

/// Errors raised by the session environment and its services.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging could not be set up.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// A persisted document could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The installer failed to parse or resolve.
    #[error("installer error: {0}")]
    Installer(#[from] InstallerError),

    /// The application registry rejected an operation.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A favorites operation failed.
    #[error("favorites error: {0}")]
    Favorites(#[from] FavoritesError),

    /// A preferences script is not a valid document.
    #[error("invalid preferences script: {0}")]
    Preferences(String),

    /// The builder is missing a collaborator without a default.
    #[error("environment is missing a {0}")]
    MissingComponent(&'static str),
}

/// Result type for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;
