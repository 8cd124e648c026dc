//! Capability contributions and their deterministic merge.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A contribution function: takes a context object, returns a list.
///
/// Contexts and results are opaque to the shell; plugins and renderers
/// agree on their shape.
pub type Contributor = Arc<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;

/// Per-package application data: key to list of values.
pub type ApplicationData = BTreeMap<String, Vec<Value>>;

/// Identity of a manifest.
///
/// A plugin's own manifest has a single id; the merged manifest carries
/// the ids of everything that contributed to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestId {
    /// One contributor.
    Single(String),
    /// Ordered ids of a merged manifest.
    Merged(Vec<String>),
}

impl ManifestId {
    /// All ids, flattened.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        match self {
            Self::Single(id) => vec![id.clone()],
            Self::Merged(ids) => ids.clone(),
        }
    }
}

impl From<&str> for ManifestId {
    fn from(id: &str) -> Self {
        Self::Single(id.to_owned())
    }
}

impl From<String> for ManifestId {
    fn from(id: String) -> Self {
        Self::Single(id)
    }
}

/// Favorites a manifest asks to be present by default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefaultFavorites {
    /// Explorer item ids.
    #[serde(default)]
    pub items: Vec<String>,
    /// Application item ids.
    #[serde(default)]
    pub applications: Vec<String>,
}

impl DefaultFavorites {
    /// Whether nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.applications.is_empty()
    }
}

/// What one plugin (or the merge of many) contributes to the shell.
#[derive(Clone)]
pub struct Manifest {
    /// Identity.
    pub id: ManifestId,
    /// Explorer context-menu actions.
    pub context_menu_actions: Option<Contributor>,
    /// Asset preview handlers.
    pub asset_previews: Option<Contributor>,
    /// Open-with handlers.
    pub open_with_apps: Option<Contributor>,
    /// Declared application packages.
    pub applications: Vec<String>,
    /// Data attached to application packages.
    pub applications_data: BTreeMap<String, ApplicationData>,
    /// Default favorites.
    pub favorites: DefaultFavorites,
}

impl Manifest {
    /// An empty manifest with the given id.
    #[must_use]
    pub fn new(id: impl Into<ManifestId>) -> Self {
        Self {
            id: id.into(),
            context_menu_actions: None,
            asset_previews: None,
            open_with_apps: None,
            applications: Vec::new(),
            applications_data: BTreeMap::new(),
            favorites: DefaultFavorites::default(),
        }
    }

    /// Set the declared applications.
    #[must_use]
    pub fn with_applications<I, S>(mut self, applications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applications = applications.into_iter().map(Into::into).collect();
        self
    }

    /// Add data for one application package under `key`.
    #[must_use]
    pub fn with_application_data(
        mut self,
        package: impl Into<String>,
        key: impl Into<String>,
        values: Vec<Value>,
    ) -> Self {
        self.applications_data
            .entry(package.into())
            .or_default()
            .entry(key.into())
            .or_default()
            .extend(values);
        self
    }

    /// Set the default favorites.
    #[must_use]
    pub fn with_favorites(mut self, favorites: DefaultFavorites) -> Self {
        self.favorites = favorites;
        self
    }

    /// Set the context-menu contributor.
    #[must_use]
    pub fn with_context_menu_actions<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Vec<Value> + Send + Sync + 'static,
    {
        self.context_menu_actions = Some(Arc::new(f));
        self
    }

    /// Set the asset-preview contributor.
    #[must_use]
    pub fn with_asset_previews<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Vec<Value> + Send + Sync + 'static,
    {
        self.asset_previews = Some(Arc::new(f));
        self
    }

    /// Set the open-with contributor.
    #[must_use]
    pub fn with_open_with_apps<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Vec<Value> + Send + Sync + 'static,
    {
        self.open_with_apps = Some(Arc::new(f));
        self
    }

    /// Context-menu actions for `ctx`; empty if none are contributed.
    #[must_use]
    pub fn context_menu_actions(&self, ctx: &Value) -> Vec<Value> {
        call(self.context_menu_actions.as_ref(), ctx)
    }

    /// Asset previews for `ctx`; empty if none are contributed.
    #[must_use]
    pub fn asset_previews(&self, ctx: &Value) -> Vec<Value> {
        call(self.asset_previews.as_ref(), ctx)
    }

    /// Open-with handlers for `ctx`; empty if none are contributed.
    #[must_use]
    pub fn open_with_apps(&self, ctx: &Value) -> Vec<Value> {
        call(self.open_with_apps.as_ref(), ctx)
    }

    /// Merge manifests into one.
    ///
    /// The same manifest object appearing twice counts once. The merged id
    /// lists each distinct id once, in first-occurrence order, and the
    /// contributor functions come from the first manifest of each id. The
    /// accumulating fields are collected from every manifest object, so
    /// two manifests sharing an id both contribute their applications,
    /// application data and favorites.
    #[must_use]
    pub fn merge(manifests: &[Arc<Manifest>]) -> Self {
        let mut distinct: Vec<&Arc<Manifest>> = Vec::with_capacity(manifests.len());
        for manifest in manifests {
            if !distinct.iter().any(|seen| Arc::ptr_eq(seen, manifest)) {
                distinct.push(manifest);
            }
        }

        let mut seen_ids = HashSet::new();
        let mut ids = Vec::new();
        let mut by_id: Vec<Arc<Manifest>> = Vec::new();
        for manifest in &distinct {
            let mut fresh = false;
            for id in manifest.id.ids() {
                if seen_ids.insert(id.clone()) {
                    ids.push(id);
                    fresh = true;
                }
            }
            if fresh {
                by_id.push(Arc::clone(manifest));
            }
        }

        let mut applications: Vec<String> = Vec::new();
        for manifest in &distinct {
            for app in &manifest.applications {
                if !applications.contains(app) {
                    applications.push(app.clone());
                }
            }
        }

        let applications_data =
            merge_applications_data(distinct.iter().copied().map(|m| &m.applications_data));

        let favorites = DefaultFavorites {
            items: distinct
                .iter()
                .flat_map(|m| m.favorites.items.iter().cloned())
                .collect(),
            applications: distinct
                .iter()
                .flat_map(|m| m.favorites.applications.iter().cloned())
                .collect(),
        };

        Self {
            id: ManifestId::Merged(ids),
            context_menu_actions: Some(concat_contributors(&by_id, |m| {
                m.context_menu_actions.clone()
            })),
            asset_previews: Some(concat_contributors(&by_id, |m| m.asset_previews.clone())),
            open_with_apps: Some(concat_contributors(&by_id, |m| m.open_with_apps.clone())),
            applications,
            applications_data,
            favorites,
        }
    }
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manifest")
            .field("id", &self.id)
            .field("context_menu_actions", &self.context_menu_actions.is_some())
            .field("asset_previews", &self.asset_previews.is_some())
            .field("open_with_apps", &self.open_with_apps.is_some())
            .field("applications", &self.applications)
            .field("applications_data", &self.applications_data)
            .field("favorites", &self.favorites)
            .finish()
    }
}

fn call(f: Option<&Contributor>, ctx: &Value) -> Vec<Value> {
    f.map(|f| f(ctx)).unwrap_or_default()
}

fn concat_contributors(
    manifests: &[Arc<Manifest>],
    pick: impl Fn(&Manifest) -> Option<Contributor>,
) -> Contributor {
    let parts: Vec<Contributor> = manifests.iter().filter_map(|m| pick(m.as_ref())).collect();
    Arc::new(move |ctx: &Value| parts.iter().flat_map(|f| f(ctx)).collect())
}

/// Per package, per key: concatenate in order, then keep the first of
/// values that serialize identically.
fn merge_applications_data<'a>(
    sources: impl Iterator<Item = &'a BTreeMap<String, ApplicationData>>,
) -> BTreeMap<String, ApplicationData> {
    let mut merged: BTreeMap<String, ApplicationData> = BTreeMap::new();
    let mut seen: BTreeMap<(String, String), HashSet<String>> = BTreeMap::new();

    for data in sources {
        for (package, entries) in data {
            let target = merged.entry(package.clone()).or_default();
            for (key, values) in entries {
                let list = target.entry(key.clone()).or_default();
                let keys = seen.entry((package.clone(), key.clone())).or_default();
                for value in values {
                    if keys.insert(value.to_string()) {
                        list.push(value.clone());
                    }
                }
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_of_nothing() {
        let merged = Manifest::merge(&[]);
        assert_eq!(merged.id, ManifestId::Merged(vec![]));
        assert!(merged.applications.is_empty());
        assert!(merged.applications_data.is_empty());
        assert!(merged.favorites.is_empty());
        assert!(merged.context_menu_actions(&json!({})).is_empty());
        assert!(merged.asset_previews(&json!({})).is_empty());
        assert!(merged.open_with_apps(&json!({})).is_empty());
    }

    #[test]
    fn test_same_id_manifests_collapse_but_accumulate() {
        let a = Arc::new(Manifest::new("x").with_applications(["p1"]));
        let b = Arc::new(Manifest::new("x").with_applications(["p2"]));

        let merged = Manifest::merge(&[a, b]);

        assert_eq!(merged.id, ManifestId::Merged(vec!["x".into()]));
        assert_eq!(merged.applications, vec!["p1".to_string(), "p2".to_string()]);
    }

    #[test]
    fn test_same_object_counts_once() {
        let a = Arc::new(
            Manifest::new("a")
                .with_favorites(DefaultFavorites {
                    items: vec!["i1".into()],
                    applications: vec![],
                })
                .with_context_menu_actions(|_| vec![json!("open")]),
        );

        let merged = Manifest::merge(&[Arc::clone(&a), a]);

        assert_eq!(merged.favorites.items, vec!["i1".to_string()]);
        assert_eq!(merged.context_menu_actions(&json!({})), vec![json!("open")]);
    }

    #[test]
    fn test_contributors_concatenate_in_order() {
        let a = Arc::new(Manifest::new("a").with_asset_previews(|ctx| vec![json!(["a", ctx])]));
        let b = Arc::new(Manifest::new("b"));
        let c = Arc::new(Manifest::new("c").with_asset_previews(|_| vec![json!("c1"), json!("c2")]));

        let merged = Manifest::merge(&[a, b, c]);
        let previews = merged.asset_previews(&json!(1));

        assert_eq!(previews, vec![json!(["a", 1]), json!("c1"), json!("c2")]);
    }

    #[test]
    fn test_applications_are_unique() {
        let a = Arc::new(Manifest::new("a").with_applications(["p1", "p2"]));
        let b = Arc::new(Manifest::new("b").with_applications(["p2", "p3"]));

        let merged = Manifest::merge(&[a, b]);
        assert_eq!(merged.applications, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_applications_data_dedup_by_serialized_value() {
        let a = Arc::new(
            Manifest::new("a")
                .with_application_data("@youwol/stories", "openWith", vec![json!({"k": 1}), json!({"k": 2})]),
        );
        let b = Arc::new(
            Manifest::new("b")
                .with_application_data("@youwol/stories", "openWith", vec![json!({"k": 2}), json!({"k": 3})])
                .with_application_data("@youwol/stories", "other", vec![json!(true)])
                .with_application_data("@youwol/explorer", "openWith", vec![json!({"k": 1})]),
        );

        let merged = Manifest::merge(&[a, b]);
        let stories = &merged.applications_data["@youwol/stories"];

        assert_eq!(
            stories["openWith"],
            vec![json!({"k": 1}), json!({"k": 2}), json!({"k": 3})]
        );
        assert_eq!(stories["other"], vec![json!(true)]);
        assert_eq!(merged.applications_data["@youwol/explorer"]["openWith"].len(), 1);
    }

    #[test]
    fn test_favorites_concatenate_without_dedup() {
        let fav = DefaultFavorites {
            items: vec!["i1".into()],
            applications: vec!["app".into()],
        };
        let a = Arc::new(Manifest::new("a").with_favorites(fav.clone()));
        let b = Arc::new(Manifest::new("b").with_favorites(fav));

        let merged = Manifest::merge(&[a, b]);
        assert_eq!(merged.favorites.items, vec!["i1", "i1"]);
        assert_eq!(merged.favorites.applications, vec!["app", "app"]);
    }

    #[test]
    fn test_merged_ids_flatten() {
        let inner = Arc::new(Manifest {
            id: ManifestId::Merged(vec!["a".into(), "b".into()]),
            ..Manifest::new("ignored")
        });
        let c = Arc::new(Manifest::new("b"));

        let merged = Manifest::merge(&[inner, c]);
        assert_eq!(merged.id.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_manifest_id_serde() {
        assert_eq!(serde_json::to_value(ManifestId::from("x")).unwrap(), json!("x"));
        let merged: ManifestId = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(merged, ManifestId::Merged(vec!["a".into(), "b".into()]));
    }
}
