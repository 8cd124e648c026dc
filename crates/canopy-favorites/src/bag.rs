//! Persisted favorites.
//!
//! All four collections are stored together in one blob and always
//! transferred whole:
//!
//! ```json
//! {
//!   "favoriteGroups": [{"id": "L3lvdXdvbC11c2Vycw=="}],
//!   "favoriteFolders": [{"id": "folder-1"}],
//!   "favoriteItems": [{"id": "asset-1"}],
//!   "favoriteApplications": []
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::FavoriteEntity;
use crate::kind::FavoriteKind;

/// Persisted reference to a favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRef {
    /// Entity id.
    pub id: String,
}

/// The persisted favorites blob.
///
/// Decoding is lenient: a missing or malformed collection is empty and
/// entries without a string `id` are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct FavoritesBag {
    /// Groups.
    pub favorite_groups: Vec<FavoriteRef>,
    /// Folders.
    pub favorite_folders: Vec<FavoriteRef>,
    /// Items.
    pub favorite_items: Vec<FavoriteRef>,
    /// Applications.
    pub favorite_applications: Vec<FavoriteRef>,
}

impl FavoritesBag {
    /// References of one collection.
    #[must_use]
    pub fn refs(&self, kind: FavoriteKind) -> &[FavoriteRef] {
        match kind {
            FavoriteKind::Groups => &self.favorite_groups,
            FavoriteKind::Folders => &self.favorite_folders,
            FavoriteKind::Items => &self.favorite_items,
            FavoriteKind::Applications => &self.favorite_applications,
        }
    }

    fn refs_mut(&mut self, kind: FavoriteKind) -> &mut Vec<FavoriteRef> {
        match kind {
            FavoriteKind::Groups => &mut self.favorite_groups,
            FavoriteKind::Folders => &mut self.favorite_folders,
            FavoriteKind::Items => &mut self.favorite_items,
            FavoriteKind::Applications => &mut self.favorite_applications,
        }
    }

    /// Ids of one collection, in stored order.
    #[must_use]
    pub fn ids(&self, kind: FavoriteKind) -> Vec<String> {
        self.refs(kind).iter().map(|r| r.id.clone()).collect()
    }

    /// Whether `id` is stored in `kind`.
    #[must_use]
    pub fn contains(&self, kind: FavoriteKind, id: &str) -> bool {
        self.refs(kind).iter().any(|r| r.id == id)
    }

    /// Replace one collection.
    pub fn set_ids<I, S>(&mut self, kind: FavoriteKind, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.refs_mut(kind) = ids.into_iter().map(|id| FavoriteRef { id: id.into() }).collect();
    }

    /// Replace one collection with the ids of hydrated entities.
    pub fn set_entities(&mut self, kind: FavoriteKind, entities: &[FavoriteEntity]) {
        self.set_ids(kind, entities.iter().map(FavoriteEntity::id));
    }

    /// Total number of references.
    #[must_use]
    pub fn len(&self) -> usize {
        FavoriteKind::ALL
            .iter()
            .map(|kind| self.refs(*kind).len())
            .fold(0, usize::saturating_add)
    }

    /// Whether every collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        FavoriteKind::ALL.iter().all(|kind| self.refs(*kind).is_empty())
    }
}

impl From<Value> for FavoritesBag {
    fn from(value: Value) -> Self {
        let mut bag = Self::default();
        for kind in FavoriteKind::ALL {
            let ids = value
                .get(kind.target_key())
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|entry| entry.get("id")?.as_str())
                        .map(str::to_owned)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            bag.set_ids(kind, ids);
        }
        bag
    }
}

/// Default favorites already offered to the user.
///
/// Stored in its own blob so that a default the user removed is not added
/// again in a later session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefaultsMarker {
    /// Item ids already offered.
    #[serde(default)]
    pub items: Vec<String>,
    /// Application ids already offered.
    #[serde(default)]
    pub applications: Vec<String>,
}

impl DefaultsMarker {
    fn ids_mut(&mut self, kind: FavoriteKind) -> Option<&mut Vec<String>> {
        match kind {
            FavoriteKind::Items => Some(&mut self.items),
            FavoriteKind::Applications => Some(&mut self.applications),
            FavoriteKind::Groups | FavoriteKind::Folders => None,
        }
    }

    /// Whether `id` was already offered in `kind`.
    #[must_use]
    pub fn contains(&self, kind: FavoriteKind, id: &str) -> bool {
        match kind {
            FavoriteKind::Items => self.items.iter().any(|i| i == id),
            FavoriteKind::Applications => self.applications.iter().any(|i| i == id),
            FavoriteKind::Groups | FavoriteKind::Folders => false,
        }
    }

    /// Record `id` as offered. Returns `false` if it already was, or if
    /// `kind` has no defaults.
    pub fn insert(&mut self, kind: FavoriteKind, id: &str) -> bool {
        if self.contains(kind, id) {
            return false;
        }
        match self.ids_mut(kind) {
            Some(ids) => {
                ids.push(id.to_owned());
                true
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_decoding() {
        let bag: FavoritesBag = serde_json::from_value(json!({
            "favoriteGroups": "not-an-array",
            "favoriteFolders": [{"id": "f1"}, {"name": "no id"}, {"id": 3}],
            "favoriteItems": [{"id": "i1", "type": "story"}],
        }))
        .unwrap();

        assert!(bag.favorite_groups.is_empty());
        assert_eq!(bag.ids(FavoriteKind::Folders), vec!["f1"]);
        assert_eq!(bag.ids(FavoriteKind::Items), vec!["i1"]);
        assert!(bag.favorite_applications.is_empty());
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_non_object_is_empty() {
        let bag = FavoritesBag::from(json!(null));
        assert!(bag.is_empty());
    }

    #[test]
    fn test_serializes_all_four_keys() {
        let mut bag = FavoritesBag::default();
        bag.set_ids(FavoriteKind::Applications, ["a1"]);

        let value = serde_json::to_value(&bag).unwrap();
        assert_eq!(
            value,
            json!({
                "favoriteGroups": [],
                "favoriteFolders": [],
                "favoriteItems": [],
                "favoriteApplications": [{"id": "a1"}],
            })
        );
    }

    #[test]
    fn test_marker_insert() {
        let mut marker = DefaultsMarker::default();
        assert!(marker.insert(FavoriteKind::Items, "i1"));
        assert!(!marker.insert(FavoriteKind::Items, "i1"));
        assert!(!marker.insert(FavoriteKind::Folders, "f1"));
        assert!(marker.contains(FavoriteKind::Items, "i1"));
        assert!(!marker.contains(FavoriteKind::Applications, "i1"));
    }
}
