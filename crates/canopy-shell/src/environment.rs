//! The session environment.
//!
//! One [`Environment`] exists per top-level shell session. It owns the
//! event bus, the application registry, the favorites facade and the
//! cached installer and preferences state, and is shared as an
//! `Arc<Environment>` by everything running in the session.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use canopy_config::Config;
use canopy_core::SafeMode;
use canopy_events::{EventBus, EventReceiver};
use canopy_favorites::{EntityResolver, FavoriteKind, FavoritesFacade};
use canopy_installer::{LibraryRegistry, ModuleLoader};
use canopy_platform::{FrameHost, PlatformState, WindowLauncher};
use canopy_storage::{BlobStore, MemoryBlobStore};

use crate::child::ChildApplicationApi;
use crate::config_bridge::to_url_scheme;
use crate::error::{ShellError, ShellResult};
use crate::installer_service::InstallerService;
use crate::preferences::PreferencesService;
use crate::requests::{PackageResources, RequestsExecutor};

/// Everything a shell session shares.
pub struct Environment {
    config: Config,
    bus: EventBus,
    safe_mode: SafeMode,
    requests: Arc<RequestsExecutor>,
    installer: InstallerService,
    preferences: PreferencesService,
    platform: Arc<PlatformState>,
    favorites: FavoritesFacade,
}

impl Environment {
    /// Start assembling a session.
    #[must_use]
    pub fn builder(config: Config) -> EnvironmentBuilder {
        EnvironmentBuilder::new(config)
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Session event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Receive transport failures from every subsystem.
    #[must_use]
    pub fn subscribe_errors(&self) -> EventReceiver {
        self.bus.subscribe_errors()
    }

    /// Remote document access.
    #[must_use]
    pub fn requests(&self) -> &Arc<RequestsExecutor> {
        &self.requests
    }

    /// Installer script and manifest.
    #[must_use]
    pub fn installer(&self) -> &InstallerService {
        &self.installer
    }

    /// User preferences.
    #[must_use]
    pub fn preferences(&self) -> &PreferencesService {
        &self.preferences
    }

    /// Application registry.
    #[must_use]
    pub fn platform(&self) -> &Arc<PlatformState> {
        &self.platform
    }

    /// Favorites collections.
    #[must_use]
    pub fn favorites(&self) -> &FavoritesFacade {
        &self.favorites
    }

    /// Ignore user scripts from now on.
    ///
    /// Values already resolved stay cached; only later reads of the
    /// installer and preferences scripts fall back to the defaults.
    pub fn set_safe_mode(&self) {
        if !self.safe_mode.is_enabled() {
            warn!("safe mode enabled: user scripts are ignored");
        }
        self.safe_mode.enable();
    }

    /// Whether user scripts are ignored.
    #[must_use]
    pub fn is_safe_mode(&self) -> bool {
        self.safe_mode.is_enabled()
    }

    /// The child-application API for a page started by this session.
    #[must_use]
    pub fn child_api(&self, location: impl Into<String>) -> ChildApplicationApi {
        ChildApplicationApi::embedded(self.platform.clone(), location)
    }

    /// Add the manifest's default favorites that were never offered.
    ///
    /// # Errors
    ///
    /// Returns the manifest resolution error or the favorites storage
    /// error.
    pub async fn apply_default_favorites(&self) -> ShellResult<Vec<(FavoriteKind, String)>> {
        let manifest = self.installer.install_manifest().await?;
        let added = self
            .favorites
            .reconcile_default_favorites(&manifest.favorites)
            .await?;
        Ok(added)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("safe_mode", &self.safe_mode.is_enabled())
            .field("installer", &self.installer)
            .field("platform", &self.platform)
            .field("favorites", &self.favorites)
            .finish_non_exhaustive()
    }
}

/// Assembles an [`Environment`] from its collaborators.
///
/// The blob store defaults to an in-memory store and the module loader to
/// an empty [`LibraryRegistry`]. Package resources, the entity resolver and
/// the window launcher have no default.
pub struct EnvironmentBuilder {
    config: Config,
    bus: Option<EventBus>,
    store: Option<Arc<dyn BlobStore>>,
    resources: Option<Arc<dyn PackageResources>>,
    loader: Option<Arc<dyn ModuleLoader>>,
    resolver: Option<Arc<dyn EntityResolver>>,
    launcher: Option<Arc<dyn WindowLauncher>>,
    frames: Option<Arc<dyn FrameHost>>,
}

impl EnvironmentBuilder {
    /// A builder for a session configured by `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            bus: None,
            store: None,
            resources: None,
            loader: None,
            resolver: None,
            launcher: None,
            frames: None,
        }
    }

    /// Use an existing event bus instead of creating one.
    #[must_use]
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Remote blob store.
    #[must_use]
    pub fn blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Source of application package resources.
    #[must_use]
    pub fn package_resources(mut self, resources: Arc<dyn PackageResources>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Library loader used to resolve installers.
    #[must_use]
    pub fn module_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Explorer lookups backing the favorites.
    #[must_use]
    pub fn entity_resolver(mut self, resolver: Arc<dyn EntityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Opens top-level pages.
    #[must_use]
    pub fn window_launcher(mut self, launcher: Arc<dyn WindowLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Hosts instance frames.
    #[must_use]
    pub fn frame_host(mut self, frames: Arc<dyn FrameHost>) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Assemble the session.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::MissingComponent`] if a collaborator without a
    /// default was not given, or a storage error if the configured owner
    /// package is not a valid key.
    pub fn build(self) -> ShellResult<Arc<Environment>> {
        let resources = self
            .resources
            .ok_or(ShellError::MissingComponent("package resource source"))?;
        let resolver = self
            .resolver
            .ok_or(ShellError::MissingComponent("entity resolver"))?;
        let launcher = self
            .launcher
            .ok_or(ShellError::MissingComponent("window launcher"))?;
        let store = self.store.unwrap_or_else(|| {
            info!("no blob store given, session documents stay in memory");
            Arc::new(MemoryBlobStore::new())
        });
        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(LibraryRegistry::new()));

        let config = self.config;
        let bus = self
            .bus
            .unwrap_or_else(|| EventBus::with_capacity(config.events.capacity));
        let safe_mode = SafeMode::new(config.session.safe_mode);

        let requests = Arc::new(RequestsExecutor::new(
            store,
            resources,
            bus.clone(),
            &config.session,
            &config.applications,
        )?);

        let installer = InstallerService::new(
            Arc::clone(&requests),
            loader,
            bus.clone(),
            safe_mode.clone(),
            &config.installer,
            &config.applications,
        );
        let preferences = PreferencesService::new(Arc::clone(&requests), safe_mode.clone());

        let mut platform = PlatformState::new(bus.clone(), launcher)
            .with_url_scheme(to_url_scheme(&config))
            .with_metadata_source(requests.clone());
        if let Some(frames) = self.frames {
            platform = platform.with_frame_host(frames);
        }

        let favorites = FavoritesFacade::new(requests.store().clone(), resolver, bus.clone())
            .with_data_names(
                config.session.favorites_data.as_str(),
                config.session.default_favorites_data.as_str(),
            );

        info!(
            owner = %config.session.owner_package,
            safe_mode = safe_mode.is_enabled(),
            "session environment ready"
        );

        Ok(Arc::new(Environment {
            config,
            bus,
            safe_mode,
            requests,
            installer,
            preferences,
            platform: Arc::new(platform),
            favorites,
        }))
    }
}

impl fmt::Debug for EnvironmentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentBuilder")
            .field("has_store", &self.store.is_some())
            .field("has_resources", &self.resources.is_some())
            .field("has_loader", &self.loader.is_some())
            .field("has_resolver", &self.resolver.is_some())
            .field("has_launcher", &self.launcher.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use canopy_core::Widget;
    use canopy_favorites::{FolderEntity, ItemEntity, ResolveError};
    use canopy_platform::{CreateInstance, PlatformResult, Target};
    use canopy_storage::StorageResult;
    use serde_json::{Value, json};

    struct Cdn;

    #[async_trait]
    impl PackageResources for Cdn {
        async fn resource(&self, cdn_package: &str, _: &str, _: &str) -> StorageResult<Option<Value>> {
            Ok(Some(json!({ "cdnPackage": cdn_package, "displayName": "Stories" })))
        }
    }

    struct Explorer;

    #[async_trait]
    impl EntityResolver for Explorer {
        async fn folder(&self, folder_id: &str) -> Result<FolderEntity, ResolveError> {
            Err(ResolveError::NotFound(folder_id.to_owned()))
        }

        async fn item(&self, asset_id: &str) -> Result<ItemEntity, ResolveError> {
            Err(ResolveError::NotFound(asset_id.to_owned()))
        }
    }

    #[derive(Default)]
    struct Opened(Mutex<Vec<String>>);

    impl WindowLauncher for Opened {
        fn open(&self, url: &str, _: Target) -> PlatformResult<()> {
            self.0.lock().unwrap().push(url.to_owned());
            Ok(())
        }
    }

    fn builder(config: Config) -> EnvironmentBuilder {
        Environment::builder(config)
            .package_resources(Arc::new(Cdn))
            .entity_resolver(Arc::new(Explorer))
            .window_launcher(Arc::new(Opened::default()))
    }

    #[test]
    fn test_missing_launcher_is_rejected() {
        let err = Environment::builder(Config::default())
            .package_resources(Arc::new(Cdn))
            .entity_resolver(Arc::new(Explorer))
            .build()
            .unwrap_err();
        assert!(matches!(err, ShellError::MissingComponent("window launcher")));
    }

    #[test]
    fn test_config_flows_into_session() {
        let config = Config::from_toml_str(
            r#"
            [session]
            safe_mode = true

            [applications]
            url_prefix = "/apps"

            [events]
            capacity = 16
            "#,
        )
        .unwrap();
        let env = builder(config).build().unwrap();

        assert!(env.is_safe_mode());
        assert_eq!(env.bus().capacity(), 16);
        assert_eq!(env.platform().url_scheme().prefix(), "/apps");
    }

    #[tokio::test]
    async fn test_safe_mode_switches_to_default_scripts() {
        let env = builder(Config::default()).build().unwrap();
        assert!(!env.is_safe_mode());

        env.set_safe_mode();
        assert!(env.is_safe_mode());
        assert_eq!(
            env.installer().installer_script().await.unwrap(),
            env.installer().default_script()
        );
    }

    #[tokio::test]
    async fn test_instances_get_metadata_from_requests() {
        let env = builder(Config::default()).build().unwrap();
        let app = env
            .platform()
            .create_instance(CreateInstance::new("@youwol/stories"))
            .await;

        assert_eq!(app.metadata().latest().unwrap().display_name, "Stories");
        assert_eq!(app.snippet().latest(), Some(Widget::text("Stories")));
    }

    #[tokio::test]
    async fn test_child_api_reaches_session_registry() {
        let env = builder(Config::default()).build().unwrap();
        let app = env.platform().register(CreateInstance::new("@youwol/stories"));

        let child = env.child_api(app.url());
        assert_eq!(child.app_instance_id(), Some(app.instance_id()));
        assert!(child.set_properties(Widget::text("hello")));
    }
}
