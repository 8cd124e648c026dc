//! Typed access to the session's remote documents.
//!
//! Every document the shell persists lives in the blob store under the
//! owner package: the favorites bag, the installer script, the preferences
//! script and the default-favorites marker. Application metadata is read
//! from a resource published next to each application package.
//!
//! Failures are published on the bus's error channel before being returned,
//! so a notification surface sees them even when the caller recovers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use canopy_config::{ApplicationsSection, SessionSection};
use canopy_core::ApplicationInfo;
use canopy_events::{EventBus, TransportFailure};
use canopy_favorites::{DefaultsMarker, FavoritesBag};
use canopy_installer::ScriptSource;
use canopy_platform::MetadataSource;
use canopy_storage::{BlobStore, ScopedBlobStore, StorageError, StorageResult};

use crate::error::ShellResult;

const EVENT_SOURCE: &str = "requests";

/// Read access to the files served with an application package.
#[async_trait]
pub trait PackageResources: Send + Sync {
    /// The JSON resource at `path` of `cdn_package` at `version`.
    ///
    /// `Ok(None)` means the package does not publish the resource.
    async fn resource(
        &self,
        cdn_package: &str,
        version: &str,
        path: &str,
    ) -> StorageResult<Option<Value>>;
}

/// Typed reads and writes of the session's persisted documents.
pub struct RequestsExecutor {
    store: ScopedBlobStore,
    resources: Arc<dyn PackageResources>,
    bus: EventBus,
    session: SessionSection,
    metadata_resource: String,
}

impl RequestsExecutor {
    /// An executor over `store`, scoped to the session's owner package.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the owner package is not a valid key.
    pub fn new(
        store: Arc<dyn BlobStore>,
        resources: Arc<dyn PackageResources>,
        bus: EventBus,
        session: &SessionSection,
        applications: &ApplicationsSection,
    ) -> ShellResult<Self> {
        Ok(Self {
            store: ScopedBlobStore::new(store, session.owner_package.clone())?,
            resources,
            bus,
            session: session.clone(),
            metadata_resource: applications.metadata_resource.clone(),
        })
    }

    /// The blob store scoped to the owner package.
    #[must_use]
    pub fn store(&self) -> &ScopedBlobStore {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Scripts
    // -----------------------------------------------------------------------

    /// The persisted installer script, if any.
    ///
    /// # Errors
    ///
    /// Returns the storage error after reporting it.
    pub async fn installer_script(&self) -> ShellResult<Option<ScriptSource>> {
        self.fetch("get_installer_script", &self.session.installer_data)
            .await
    }

    /// Persist the installer script.
    ///
    /// # Errors
    ///
    /// Returns the storage error after reporting it.
    pub async fn save_installer_script(&self, script: &ScriptSource) -> ShellResult<()> {
        self.save("save_installer_script", &self.session.installer_data, script)
            .await
    }

    /// The persisted preferences script, if any.
    ///
    /// # Errors
    ///
    /// Returns the storage error after reporting it.
    pub async fn preferences_script(&self) -> ShellResult<Option<ScriptSource>> {
        self.fetch("get_preferences_script", &self.session.preferences_data)
            .await
    }

    /// Persist the preferences script.
    ///
    /// # Errors
    ///
    /// Returns the storage error after reporting it.
    pub async fn save_preferences_script(&self, script: &ScriptSource) -> ShellResult<()> {
        self.save(
            "save_preferences_script",
            &self.session.preferences_data,
            script,
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Favorites documents
    // -----------------------------------------------------------------------

    /// The persisted favorites bag, if any.
    ///
    /// Writes go through the favorites facade, which owns the bag.
    ///
    /// # Errors
    ///
    /// Returns the storage error after reporting it.
    pub async fn favorites(&self) -> ShellResult<Option<FavoritesBag>> {
        self.fetch("get_favorites", &self.session.favorites_data).await
    }

    /// The persisted default-favorites marker, if any.
    ///
    /// # Errors
    ///
    /// Returns the storage error after reporting it.
    pub async fn default_favorites_marker(&self) -> ShellResult<Option<DefaultsMarker>> {
        self.fetch(
            "get_default_favorites",
            &self.session.default_favorites_data,
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Application metadata
    // -----------------------------------------------------------------------

    /// Metadata published by `cdn_package` at `version`.
    ///
    /// Lookups never fail: transport errors are reported and, like a missing
    /// or malformed document, yield `None`.
    pub async fn application_info(&self, cdn_package: &str, version: &str) -> Option<ApplicationInfo> {
        let document = match self
            .resources
            .resource(cdn_package, version, &self.metadata_resource)
            .await
        {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!(cdn_package, version, "package publishes no metadata");
                return None;
            },
            Err(e) => {
                self.report("get_application_info", &e);
                return None;
            },
        };

        match serde_json::from_value::<ApplicationInfo>(document) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(cdn_package, version, error = %e, "malformed application metadata");
                None
            },
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &str,
        data_name: &str,
    ) -> ShellResult<Option<T>> {
        self.store.get_json(data_name).await.map_err(|e| {
            self.report(operation, &e);
            e.into()
        })
    }

    async fn save<T: Serialize + Sync>(
        &self,
        operation: &str,
        data_name: &str,
        value: &T,
    ) -> ShellResult<()> {
        self.store.put_json(data_name, value).await.map_err(|e| {
            self.report(operation, &e);
            e.into()
        })
    }

    fn report(&self, operation: &str, error: &StorageError) {
        let mut failure = TransportFailure::new(operation, error.to_string());
        if let Some(status) = error.status() {
            failure = failure.with_status(status);
        }
        self.bus.report_failure(EVENT_SOURCE, failure);
    }
}

#[async_trait]
impl MetadataSource for RequestsExecutor {
    async fn application_info(&self, cdn_package: &str, version: &str) -> Option<ApplicationInfo> {
        RequestsExecutor::application_info(self, cdn_package, version).await
    }
}

impl fmt::Debug for RequestsExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestsExecutor")
            .field("package", &self.store.package())
            .field("metadata_resource", &self.metadata_resource)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use canopy_storage::{BlobKey, MemoryBlobStore};
    use serde_json::json;

    #[derive(Default)]
    struct Cdn {
        resources: HashMap<String, Value>,
        unreachable: bool,
    }

    #[async_trait]
    impl PackageResources for Cdn {
        async fn resource(
            &self,
            cdn_package: &str,
            version: &str,
            path: &str,
        ) -> StorageResult<Option<Value>> {
            if self.unreachable {
                return Err(StorageError::Transport {
                    status: Some(503),
                    message: "cdn unavailable".into(),
                });
            }
            Ok(self
                .resources
                .get(&format!("{cdn_package}/{version}/{path}"))
                .cloned())
        }
    }

    fn executor(store: MemoryBlobStore, cdn: Cdn, bus: &EventBus) -> RequestsExecutor {
        RequestsExecutor::new(
            Arc::new(store),
            Arc::new(cdn),
            bus.clone(),
            &SessionSection::default(),
            &ApplicationsSection::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_installer_script_round_trip() {
        let requests = executor(MemoryBlobStore::new(), Cdn::default(), &EventBus::new());
        assert!(requests.installer_script().await.unwrap().is_none());

        let script = ScriptSource::declarative("from_libraries = []");
        requests.save_installer_script(&script).await.unwrap();
        assert_eq!(requests.installer_script().await.unwrap(), Some(script));
        assert!(requests.preferences_script().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scripts_are_stored_under_owner_package() {
        let store = Arc::new(MemoryBlobStore::new());
        let requests = RequestsExecutor::new(
            store.clone(),
            Arc::new(Cdn::default()),
            EventBus::new(),
            &SessionSection::default(),
            &ApplicationsSection::default(),
        )
        .unwrap();
        requests
            .save_preferences_script(&ScriptSource::declarative("css_theme = 'dark'"))
            .await
            .unwrap();

        let key = BlobKey::new("@youwol/os-core", "preferences").unwrap();
        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(stored["jsSrc"], "css_theme = 'dark'");
    }

    #[tokio::test]
    async fn test_malformed_document_is_reported() {
        let key = BlobKey::new("@youwol/os-core", "installer").unwrap();
        let store = MemoryBlobStore::with_blobs([(key, json!(42))]);
        let bus = EventBus::new();
        let mut errors = bus.subscribe_errors();
        let requests = executor(store, Cdn::default(), &bus);

        assert!(requests.installer_script().await.is_err());
        let event = errors.recv().await.unwrap();
        assert_eq!(
            event.as_transport_error().unwrap().operation,
            "get_installer_script"
        );
    }

    #[tokio::test]
    async fn test_application_info_found() {
        let mut cdn = Cdn::default();
        cdn.resources.insert(
            "@youwol/stories/latest/.yw_metadata.json".into(),
            json!({ "cdnPackage": "@youwol/stories", "displayName": "Stories" }),
        );
        let requests = executor(MemoryBlobStore::new(), cdn, &EventBus::new());

        let info = requests.application_info("@youwol/stories", "latest").await.unwrap();
        assert_eq!(info.display_name, "Stories");
        assert!(requests.application_info("@youwol/flux", "latest").await.is_none());
    }

    #[tokio::test]
    async fn test_application_info_swallows_failures() {
        let bus = EventBus::new();
        let mut errors = bus.subscribe_errors();
        let cdn = Cdn {
            unreachable: true,
            ..Cdn::default()
        };
        let requests = executor(MemoryBlobStore::new(), cdn, &bus);

        assert!(requests.application_info("@youwol/stories", "latest").await.is_none());
        let event = errors.recv().await.unwrap();
        assert_eq!(event.as_transport_error().unwrap().status, Some(503));
    }

    #[tokio::test]
    async fn test_malformed_metadata_is_none() {
        let mut cdn = Cdn::default();
        cdn.resources.insert(
            "@youwol/stories/latest/.yw_metadata.json".into(),
            json!({ "displayName": 3 }),
        );
        let requests = executor(MemoryBlobStore::new(), cdn, &EventBus::new());
        assert!(requests.application_info("@youwol/stories", "latest").await.is_none());
    }
}
