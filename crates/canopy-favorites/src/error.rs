//! Favorites error types.

use canopy_storage::StorageError;
use thiserror::Error;

use crate::kind::FavoriteKind;

/// Why an entity could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The explorer has no such entity.
    #[error("not found: {0}")]
    NotFound(String),

    /// The explorer could not be reached or answered with an error.
    #[error("transport error: {message}")]
    Transport {
        /// Status reported by the explorer, if any.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    /// A group id is not a base64-encoded path.
    #[error("invalid group id: {0}")]
    InvalidGroupId(String),
}

impl ResolveError {
    /// Status code carried by a transport error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::NotFound(_) => Some(404),
            Self::InvalidGroupId(_) => None,
        }
    }
}

/// Errors from favorites operations.
#[derive(Debug, Error)]
pub enum FavoritesError {
    /// The favorites bag could not be fetched.
    #[error("failed to fetch favorites: {0}")]
    Fetch(#[source] StorageError),

    /// The favorites bag could not be saved.
    #[error("failed to save favorites: {0}")]
    Save(#[source] StorageError),

    /// An entity to add could not be resolved.
    #[error("failed to resolve {kind} entry '{id}': {source}")]
    Resolve {
        /// Collection the entity was meant for.
        kind: FavoriteKind,
        /// Requested id.
        id: String,
        /// Underlying failure.
        #[source]
        source: ResolveError,
    },
}

/// Result type for favorites operations.
pub type FavoritesResult<T> = Result<T, FavoritesError>;
