//! Canopy Favorites - the favorites facade of the Canopy desktop shell.
//!
//! Users favorite groups, folders, items and applications. The four
//! collections are persisted together as one blob per owner package and
//! hydrated into explorer entities on first access.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use canopy_events::EventBus;
//! use canopy_favorites::{EntityResolver, FavoriteKind, FavoritesFacade};
//! use canopy_storage::{MemoryBlobStore, ScopedBlobStore};
//!
//! # async fn example(resolver: Arc<dyn EntityResolver>) -> Result<(), Box<dyn std::error::Error>> {
//! let store = ScopedBlobStore::new(Arc::new(MemoryBlobStore::new()), "@youwol/os-core")?;
//! let favorites = FavoritesFacade::new(store, resolver, EventBus::new());
//!
//! favorites.toggle_favorite_folder("folder-1").await?;
//! let folders = favorites.get(FavoriteKind::Folders).await?;
//! assert_eq!(folders[0].id(), "folder-1");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bag;
mod entity;
mod error;
mod facade;
mod kind;

pub use bag::{DefaultsMarker, FavoriteRef, FavoritesBag};
pub use entity::{
    EntityResolver, FavoriteEntity, FolderEntity, ItemEntity, decode_group, resolve_entity,
};
pub use error::{FavoritesError, FavoritesResult, ResolveError};
pub use facade::{DEFAULT_FAVORITES_DATA, DEFAULT_MARKER_DATA, FavoritesFacade};
pub use kind::FavoriteKind;
