//! The favorites facade.
//!
//! Each collection is a lazily created replay cache. The first access to
//! any of them fetches the favorites bag once; every collection hydrates
//! its own ids from that shared fetch, resolving entities in parallel.
//!
//! Mutations read the current value of all four collections, compute the
//! new one, publish it, then write the whole bag back. There is no version
//! check: two overlapping mutations may lose one of the remote writes,
//! and a failed write leaves the caches ahead of the store until the next
//! successful one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use canopy_core::{ReplayCache, ReplayReceiver};
use canopy_events::{EventBus, EventMetadata, ShellEvent, TransportFailure};
use canopy_installer::DefaultFavorites;
use canopy_storage::{ScopedBlobStore, StorageError};

use crate::bag::{DefaultsMarker, FavoritesBag};
use crate::entity::{EntityResolver, FavoriteEntity, resolve_entity};
use crate::error::{FavoritesError, FavoritesResult, ResolveError};
use crate::kind::FavoriteKind;

/// Data name of the favorites bag.
pub const DEFAULT_FAVORITES_DATA: &str = "favorites";

/// Data name of the default-favorites marker.
pub const DEFAULT_MARKER_DATA: &str = "favorites-defaults";

const EVENT_SOURCE: &str = "favorites";

type Collections = BTreeMap<FavoriteKind, Vec<FavoriteEntity>>;

/// Session-wide access to the four favorites collections.
pub struct FavoritesFacade {
    store: ScopedBlobStore,
    resolver: Arc<dyn EntityResolver>,
    bus: EventBus,
    data_name: String,
    marker_name: String,

    bag: ReplayCache<FavoritesBag>,
    groups: ReplayCache<Vec<FavoriteEntity>>,
    folders: ReplayCache<Vec<FavoriteEntity>>,
    items: ReplayCache<Vec<FavoriteEntity>>,
    applications: ReplayCache<Vec<FavoriteEntity>>,
}

impl FavoritesFacade {
    /// A facade over the bag stored in `store`.
    #[must_use]
    pub fn new(store: ScopedBlobStore, resolver: Arc<dyn EntityResolver>, bus: EventBus) -> Self {
        Self {
            store,
            resolver,
            bus,
            data_name: DEFAULT_FAVORITES_DATA.to_owned(),
            marker_name: DEFAULT_MARKER_DATA.to_owned(),
            bag: ReplayCache::new(),
            groups: ReplayCache::new(),
            folders: ReplayCache::new(),
            items: ReplayCache::new(),
            applications: ReplayCache::new(),
        }
    }

    /// Store the bag and the marker under other data names.
    #[must_use]
    pub fn with_data_names(
        mut self,
        favorites: impl Into<String>,
        marker: impl Into<String>,
    ) -> Self {
        self.data_name = favorites.into();
        self.marker_name = marker.into();
        self
    }

    fn cache(&self, kind: FavoriteKind) -> &ReplayCache<Vec<FavoriteEntity>> {
        match kind {
            FavoriteKind::Groups => &self.groups,
            FavoriteKind::Folders => &self.folders,
            FavoriteKind::Items => &self.items,
            FavoriteKind::Applications => &self.applications,
        }
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// The hydrated collection.
    ///
    /// Entries that fail to resolve are reported on the error channel and
    /// left out.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::Fetch`] if the bag cannot be fetched.
    pub async fn get(&self, kind: FavoriteKind) -> FavoritesResult<Vec<FavoriteEntity>> {
        self.cache(kind)
            .get_or_try_init(|| async {
                let bag = self.fetch_bag().await?;
                Ok::<_, FavoritesError>(self.hydrate(kind, &bag.ids(kind)).await)
            })
            .await
    }

    /// Follow a collection, starting with its current value.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn subscribe(
        &self,
        kind: FavoriteKind,
    ) -> FavoritesResult<ReplayReceiver<Vec<FavoriteEntity>>> {
        self.get(kind).await?;
        Ok(self.cache(kind).subscribe())
    }

    /// Ids of every collection as they would be persisted now.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn snapshot(&self) -> FavoritesResult<FavoritesBag> {
        let collections = self.collections().await?;
        Ok(bag_of(&collections))
    }

    async fn collections(&self) -> FavoritesResult<Collections> {
        let (groups, folders, items, applications) = futures::try_join!(
            self.get(FavoriteKind::Groups),
            self.get(FavoriteKind::Folders),
            self.get(FavoriteKind::Items),
            self.get(FavoriteKind::Applications),
        )?;
        Ok(Collections::from([
            (FavoriteKind::Groups, groups),
            (FavoriteKind::Folders, folders),
            (FavoriteKind::Items, items),
            (FavoriteKind::Applications, applications),
        ]))
    }

    async fn fetch_bag(&self) -> FavoritesResult<FavoritesBag> {
        self.bag
            .get_or_try_init(|| async {
                match self.store.get_json::<FavoritesBag>(&self.data_name).await {
                    Ok(bag) => {
                        let bag = bag.unwrap_or_default();
                        debug!(entries = bag.len(), "Fetched favorites");
                        Ok(bag)
                    },
                    Err(e) => {
                        self.report_storage("get_favorites", &e);
                        Err(FavoritesError::Fetch(e))
                    },
                }
            })
            .await
    }

    async fn hydrate(&self, kind: FavoriteKind, ids: &[String]) -> Vec<FavoriteEntity> {
        let resolved = join_all(ids.iter().map(|id| self.resolve(kind, id))).await;
        resolved
            .into_iter()
            .filter_map(Result::ok)
            .collect()
    }

    async fn resolve(&self, kind: FavoriteKind, id: &str) -> FavoritesResult<FavoriteEntity> {
        resolve_entity(self.resolver.as_ref(), kind, id)
            .await
            .map_err(|source| {
                self.report_resolve(kind, id, &source);
                FavoritesError::Resolve {
                    kind,
                    id: id.to_owned(),
                    source,
                }
            })
    }

    // -----------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------

    /// Add `id` to the collection, or remove it if present.
    ///
    /// Returns `true` if the entry was added. The whole bag is persisted
    /// after the collection is updated.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::Resolve`] if an entry to add cannot be
    /// resolved (nothing changes), and [`FavoritesError::Save`] if the bag
    /// cannot be written (the collection keeps its new value).
    pub async fn toggle(&self, kind: FavoriteKind, id: &str) -> FavoritesResult<bool> {
        let mut collections = self.collections().await?;
        let entries = collections.entry(kind).or_default();

        let before = entries.len();
        entries.retain(|entity| entity.id() != id);
        let added = entries.len() == before;
        if added {
            entries.push(self.resolve(kind, id).await?);
        }

        let count = entries.len();
        self.cache(kind).publish(entries.clone());
        info!(collection = %kind, id, added, count, "Favorites toggled");
        self.changed(kind, count);

        self.save(&bag_of(&collections)).await?;
        Ok(added)
    }

    /// Toggle a group.
    ///
    /// # Errors
    ///
    /// See [`toggle`](Self::toggle).
    pub async fn toggle_favorite_group(&self, id: &str) -> FavoritesResult<bool> {
        self.toggle(FavoriteKind::Groups, id).await
    }

    /// Toggle a folder.
    ///
    /// # Errors
    ///
    /// See [`toggle`](Self::toggle).
    pub async fn toggle_favorite_folder(&self, folder_id: &str) -> FavoritesResult<bool> {
        self.toggle(FavoriteKind::Folders, folder_id).await
    }

    /// Toggle an item.
    ///
    /// # Errors
    ///
    /// See [`toggle`](Self::toggle).
    pub async fn toggle_favorite_item(&self, asset_id: &str) -> FavoritesResult<bool> {
        self.toggle(FavoriteKind::Items, asset_id).await
    }

    /// Toggle an application.
    ///
    /// # Errors
    ///
    /// See [`toggle`](Self::toggle).
    pub async fn toggle_favorite_application(&self, asset_id: &str) -> FavoritesResult<bool> {
        self.toggle(FavoriteKind::Applications, asset_id).await
    }

    /// Re-resolve `modified_id` in every collection holding it, keeping its
    /// position.
    ///
    /// Membership does not change and nothing is persisted. Returns the
    /// collections that were updated; an entry that fails to resolve is
    /// reported and kept as it was.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn refresh(&self, modified_id: &str) -> FavoritesResult<Vec<FavoriteKind>> {
        let collections = self.collections().await?;
        let mut refreshed = Vec::new();

        for (kind, mut entries) in collections {
            let Some(position) = entries.iter().position(|e| e.id() == modified_id) else {
                continue;
            };
            let Ok(entity) = self.resolve(kind, modified_id).await else {
                continue;
            };
            if let Some(slot) = entries.get_mut(position) {
                *slot = entity;
            }
            self.cache(kind).publish(entries);
            refreshed.push(kind);
        }

        debug!(id = modified_id, collections = ?refreshed, "Favorites refreshed");
        Ok(refreshed)
    }

    /// Evict `deleted_id` from every collection holding it.
    ///
    /// Returns the collections it was removed from.
    ///
    /// # Errors
    ///
    /// Returns the first failing toggle's error.
    pub async fn remove(&self, deleted_id: &str) -> FavoritesResult<Vec<FavoriteKind>> {
        let collections = self.collections().await?;
        let holding: Vec<FavoriteKind> = collections
            .iter()
            .filter(|(_, entries)| entries.iter().any(|e| e.id() == deleted_id))
            .map(|(kind, _)| *kind)
            .collect();

        for kind in &holding {
            self.toggle(*kind, deleted_id).await?;
        }
        Ok(holding)
    }

    /// Add the declared default favorites not offered before.
    ///
    /// A default is offered once: it is recorded in the marker blob whether
    /// or not the user already had it, so removing it later sticks. A
    /// default that fails to resolve is not recorded and is retried in the
    /// next session. Returns the added `(collection, id)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::Fetch`] or [`FavoritesError::Save`] on
    /// storage failures; the marker is only written after the bag.
    pub async fn reconcile_default_favorites(
        &self,
        defaults: &DefaultFavorites,
    ) -> FavoritesResult<Vec<(FavoriteKind, String)>> {
        if defaults.is_empty() {
            return Ok(Vec::new());
        }
        let mut marker = self.fetch_marker().await?;
        let mut collections = self.collections().await?;
        let mut added = Vec::new();
        let mut offered = false;

        let declared = [
            (FavoriteKind::Items, &defaults.items),
            (FavoriteKind::Applications, &defaults.applications),
        ];
        for (kind, ids) in declared {
            for id in ids {
                if marker.contains(kind, id) {
                    continue;
                }
                let entries = collections.entry(kind).or_default();
                if !entries.iter().any(|e| e.id() == id.as_str()) {
                    let Ok(entity) = self.resolve(kind, id).await else {
                        continue;
                    };
                    entries.push(entity);
                    added.push((kind, id.clone()));
                }
                offered |= marker.insert(kind, id);
            }
        }

        if !added.is_empty() {
            for kind in [FavoriteKind::Items, FavoriteKind::Applications] {
                if let Some(entries) = collections.get(&kind) {
                    self.cache(kind).publish(entries.clone());
                    self.changed(kind, entries.len());
                }
            }
            self.save(&bag_of(&collections)).await?;
            info!(count = added.len(), "Default favorites added");
        }
        if offered {
            self.save_marker(&marker).await?;
        }
        Ok(added)
    }

    // -----------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------

    async fn save(&self, bag: &FavoritesBag) -> FavoritesResult<()> {
        self.bag.publish(bag.clone());
        self.store
            .put_json(&self.data_name, bag)
            .await
            .map_err(|e| {
                self.report_storage("save_favorites", &e);
                FavoritesError::Save(e)
            })
    }

    async fn fetch_marker(&self) -> FavoritesResult<DefaultsMarker> {
        match self.store.get_json::<DefaultsMarker>(&self.marker_name).await {
            Ok(marker) => Ok(marker.unwrap_or_default()),
            Err(StorageError::Serialization(message)) => {
                warn!(error = %message, "Unreadable default favorites marker, starting afresh");
                Ok(DefaultsMarker::default())
            },
            Err(e) => {
                self.report_storage("get_default_favorites_marker", &e);
                Err(FavoritesError::Fetch(e))
            },
        }
    }

    async fn save_marker(&self, marker: &DefaultsMarker) -> FavoritesResult<()> {
        self.store
            .put_json(&self.marker_name, marker)
            .await
            .map_err(|e| {
                self.report_storage("save_default_favorites_marker", &e);
                FavoritesError::Save(e)
            })
    }

    // -----------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------

    fn changed(&self, kind: FavoriteKind, count: usize) {
        self.bus.publish(ShellEvent::FavoritesChanged {
            metadata: EventMetadata::new(EVENT_SOURCE),
            collection: kind.target_key().to_owned(),
            count,
        });
    }

    fn report_storage(&self, operation: &str, error: &StorageError) {
        let mut failure = TransportFailure::new(operation, error.to_string());
        if let Some(status) = error.status() {
            failure = failure.with_status(status);
        }
        self.bus.report_failure(EVENT_SOURCE, failure);
    }

    fn report_resolve(&self, kind: FavoriteKind, id: &str, error: &ResolveError) {
        let operation = match kind {
            FavoriteKind::Groups => "decode_group",
            FavoriteKind::Folders => "get_folder",
            FavoriteKind::Items | FavoriteKind::Applications => "get_item",
        };
        let mut failure = TransportFailure::new(operation, format!("{id}: {error}"));
        if let Some(status) = error.status() {
            failure = failure.with_status(status);
        }
        self.bus.report_failure(EVENT_SOURCE, failure);
    }
}

fn bag_of(collections: &Collections) -> FavoritesBag {
    let mut bag = FavoritesBag::default();
    for (kind, entries) in collections {
        bag.set_entities(*kind, entries);
    }
    bag
}

impl fmt::Debug for FavoritesFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FavoritesFacade")
            .field("package", &self.store.package())
            .field("data_name", &self.data_name)
            .field("marker_name", &self.marker_name)
            .field("loaded", &self.bag.is_initialized())
            .finish_non_exhaustive()
    }
}
