//! Favorite collections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four favorites collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteKind {
    /// Groups, identified by their base64-encoded path.
    Groups,
    /// Explorer folders.
    Folders,
    /// Explorer items.
    Items,
    /// Applications, stored as explorer items.
    Applications,
}

impl FavoriteKind {
    /// Every collection, in bag order.
    pub const ALL: [Self; 4] = [Self::Groups, Self::Folders, Self::Items, Self::Applications];

    /// Key of the collection in the persisted bag.
    #[must_use]
    pub fn target_key(self) -> &'static str {
        match self {
            Self::Groups => "favoriteGroups",
            Self::Folders => "favoriteFolders",
            Self::Items => "favoriteItems",
            Self::Applications => "favoriteApplications",
        }
    }

    /// The collection stored under `key`.
    #[must_use]
    pub fn from_target_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.target_key() == key)
    }
}

impl fmt::Display for FavoriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_keys() {
        let keys: Vec<&str> = FavoriteKind::ALL.iter().map(|k| k.target_key()).collect();
        assert_eq!(
            keys,
            vec!["favoriteGroups", "favoriteFolders", "favoriteItems", "favoriteApplications"]
        );
        assert_eq!(FavoriteKind::from_target_key("favoriteItems"), Some(FavoriteKind::Items));
        assert_eq!(FavoriteKind::from_target_key("favoriteThings"), None);
        assert_eq!(FavoriteKind::Folders.to_string(), "favoriteFolders");
    }
}
