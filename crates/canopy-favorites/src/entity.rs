//! Hydrated favorites and the explorer seam that resolves them.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::kind::FavoriteKind;

/// An explorer folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntity {
    /// Folder id.
    pub folder_id: String,
    /// Parent folder id.
    #[serde(default)]
    pub parent_folder_id: String,
    /// Owning group.
    #[serde(default)]
    pub group_id: String,
    /// Owning drive.
    #[serde(default)]
    pub drive_id: String,
    /// Display name.
    pub name: String,
}

/// An explorer item, the tree entry of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEntity {
    /// Tree item id.
    pub item_id: String,
    /// Asset id.
    pub asset_id: String,
    /// Raw resource id.
    #[serde(default)]
    pub raw_id: String,
    /// Containing folder.
    #[serde(default)]
    pub folder_id: String,
    /// Owning group.
    #[serde(default)]
    pub group_id: String,
    /// Owning drive.
    #[serde(default)]
    pub drive_id: String,
    /// Display name.
    pub name: String,
    /// Asset kind.
    #[serde(default)]
    pub kind: String,
    /// Whether the item is a link to an asset owned elsewhere.
    #[serde(default)]
    pub borrowed: bool,
}

/// A favorited entity, hydrated from its persisted id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FavoriteEntity {
    /// A group.
    Group {
        /// Base64-encoded path.
        id: String,
        /// Decoded path.
        path: String,
    },
    /// A folder.
    Folder(FolderEntity),
    /// An item.
    Item(ItemEntity),
    /// An application.
    Application(ItemEntity),
}

impl FavoriteEntity {
    /// The id persisted for this entity.
    ///
    /// Groups keep their encoded id, folders their folder id, items and
    /// applications the id of the asset they point to.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Group { id, .. } => id,
            Self::Folder(folder) => &folder.folder_id,
            Self::Item(item) | Self::Application(item) => &item.asset_id,
        }
    }

    /// Collection the entity belongs to.
    #[must_use]
    pub fn kind(&self) -> FavoriteKind {
        match self {
            Self::Group { .. } => FavoriteKind::Groups,
            Self::Folder(_) => FavoriteKind::Folders,
            Self::Item(_) => FavoriteKind::Items,
            Self::Application(_) => FavoriteKind::Applications,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Group { path, .. } => path,
            Self::Folder(folder) => &folder.name,
            Self::Item(item) | Self::Application(item) => &item.name,
        }
    }
}

/// The group entity of a base64-encoded group id.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidGroupId`] if `id` is not base64 or does
/// not decode to UTF-8.
pub fn decode_group(id: &str) -> Result<FavoriteEntity, ResolveError> {
    let bytes = STANDARD
        .decode(id)
        .map_err(|e| ResolveError::InvalidGroupId(format!("{id}: {e}")))?;
    let path =
        String::from_utf8(bytes).map_err(|e| ResolveError::InvalidGroupId(format!("{id}: {e}")))?;
    Ok(FavoriteEntity::Group {
        id: id.to_owned(),
        path,
    })
}

/// Resolves explorer entities.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// The folder with this id.
    async fn folder(&self, folder_id: &str) -> Result<FolderEntity, ResolveError>;

    /// The item of the asset with this id.
    async fn item(&self, asset_id: &str) -> Result<ItemEntity, ResolveError>;
}

/// Resolve `id` as an entry of `kind`.
///
/// # Errors
///
/// Propagates the resolver's error, or a group decoding error.
pub async fn resolve_entity(
    resolver: &dyn EntityResolver,
    kind: FavoriteKind,
    id: &str,
) -> Result<FavoriteEntity, ResolveError> {
    match kind {
        FavoriteKind::Groups => decode_group(id),
        FavoriteKind::Folders => resolver.folder(id).await.map(FavoriteEntity::Folder),
        FavoriteKind::Items => resolver.item(id).await.map(FavoriteEntity::Item),
        FavoriteKind::Applications => resolver.item(id).await.map(FavoriteEntity::Application),
    }
}
