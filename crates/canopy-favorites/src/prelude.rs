//! Prelude module - commonly used types for convenient import.
//!
//! Use `use canopy_favorites::prelude::*;` to import all essential types.

// Errors
pub use crate::{FavoritesError, FavoritesResult, ResolveError};

// Facade
pub use crate::{FavoriteKind, FavoritesFacade};

// Entities
pub use crate::{EntityResolver, FavoriteEntity, FolderEntity, ItemEntity};
