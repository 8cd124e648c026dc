//! The session's installer: which script runs, the manifest it resolves
//! to, and the metadata of the applications it declares.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{Instrument, debug, info};

use canopy_config::{ApplicationsSection, InstallerSection};
use canopy_core::{ApplicationInfo, ReplayCache, ReplayReceiver, SafeMode};
use canopy_events::{EventBus, EventMetadata, ShellEvent};
use canopy_installer::{Manifest, ModuleLoader, ScriptSource, installer_from_script};
use canopy_telemetry::RequestContext;

use crate::error::{ShellError, ShellResult};
use crate::requests::RequestsExecutor;

const EVENT_SOURCE: &str = "installer";

/// Resolves and caches the session manifest.
pub struct InstallerService {
    requests: Arc<RequestsExecutor>,
    loader: Arc<dyn ModuleLoader>,
    bus: EventBus,
    safe_mode: SafeMode,
    settings: InstallerSection,
    default_version: String,

    manifest: ReplayCache<Arc<Manifest>>,
    applications: ReplayCache<Vec<ApplicationInfo>>,
}

impl InstallerService {
    /// A service resolving scripts read through `requests`.
    #[must_use]
    pub fn new(
        requests: Arc<RequestsExecutor>,
        loader: Arc<dyn ModuleLoader>,
        bus: EventBus,
        safe_mode: SafeMode,
        settings: &InstallerSection,
        applications: &ApplicationsSection,
    ) -> Self {
        Self {
            requests,
            loader,
            bus,
            safe_mode,
            settings: settings.clone(),
            default_version: applications.default_version.clone(),
            manifest: ReplayCache::new(),
            applications: ReplayCache::new(),
        }
    }

    /// The built-in script, installing the configured default libraries.
    #[must_use]
    pub fn default_script(&self) -> ScriptSource {
        ScriptSource::default_installer(&self.settings.default_libraries)
    }

    /// The script the session runs.
    ///
    /// The default script is used in safe mode and when the user has none
    /// or a blank one.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the persisted script cannot be read.
    pub async fn installer_script(&self) -> ShellResult<ScriptSource> {
        if self.safe_mode.is_enabled() {
            debug!("safe mode: using default installer");
            return Ok(self.default_script());
        }
        match self.requests.installer_script().await? {
            Some(script) if !script.is_blank() => Ok(script),
            _ => Ok(self.default_script()),
        }
    }

    /// Resolve `script` without persisting or publishing anything.
    ///
    /// # Errors
    ///
    /// Returns an installer error if the script does not parse or its
    /// resolution fails.
    pub async fn try_installer_script(&self, script: &ScriptSource) -> ShellResult<Manifest> {
        let installer = installer_from_script(script)?;
        let manifest = installer
            .resolve_with_depth(self.loader.as_ref(), self.settings.max_depth)
            .await?;
        Ok(manifest)
    }

    /// The session manifest, resolved once and shared by every caller.
    ///
    /// # Errors
    ///
    /// Returns the script or resolution error; the next call retries.
    pub async fn install_manifest(&self) -> ShellResult<Arc<Manifest>> {
        let ctx = RequestContext::new("installer").with_operation("install_manifest");
        self.manifest
            .get_or_try_init(|| async {
                let script = self.installer_script().await?;
                let manifest = Arc::new(self.try_installer_script(&script).await?);
                self.announce(&manifest);
                Ok::<_, ShellError>(manifest)
            })
            .instrument(ctx.span())
            .await
    }

    /// Subscribe to the session manifest and its replacements.
    #[must_use]
    pub fn subscribe_manifest(&self) -> ReplayReceiver<Arc<Manifest>> {
        self.manifest.subscribe()
    }

    /// Replace the user's installer.
    ///
    /// The script is resolved first; an invalid script changes nothing.
    /// A valid one is persisted, then published. When application metadata
    /// was already fetched it is fetched again for the new manifest.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, or the storage error if the script
    /// could not be persisted.
    pub async fn set_installer_script(&self, script: &ScriptSource) -> ShellResult<Arc<Manifest>> {
        let ctx = RequestContext::new("installer").with_operation("set_installer_script");
        async {
            let manifest = Arc::new(self.try_installer_script(script).await?);
            self.requests.save_installer_script(script).await?;

            self.manifest.publish(Arc::clone(&manifest));
            self.announce(&manifest);
            if self.applications.is_initialized() {
                let infos = self.fetch_applications_info(&manifest).await;
                self.applications.publish(infos);
            }
            info!(ids = ?manifest.id.ids(), "installer script replaced");
            Ok::<_, ShellError>(manifest)
        }
        .instrument(ctx.span())
        .await
    }

    /// Metadata of every application the manifest declares, in declaration
    /// order. Applications without metadata are left out.
    ///
    /// # Errors
    ///
    /// Returns the manifest resolution error.
    pub async fn applications_info(&self) -> ShellResult<Vec<ApplicationInfo>> {
        self.applications
            .get_or_try_init(|| async {
                let manifest = self.install_manifest().await?;
                Ok::<_, ShellError>(self.fetch_applications_info(&manifest).await)
            })
            .await
    }

    /// Subscribe to the application metadata list and its replacements.
    #[must_use]
    pub fn subscribe_applications_info(&self) -> ReplayReceiver<Vec<ApplicationInfo>> {
        self.applications.subscribe()
    }

    async fn fetch_applications_info(&self, manifest: &Manifest) -> Vec<ApplicationInfo> {
        let lookups = manifest
            .applications
            .iter()
            .map(|pkg| self.requests.application_info(pkg, &self.default_version));
        join_all(lookups).await.into_iter().flatten().collect()
    }

    fn announce(&self, manifest: &Manifest) {
        self.bus.publish(ShellEvent::ManifestResolved {
            metadata: EventMetadata::new(EVENT_SOURCE),
            manifest_ids: manifest.id.ids(),
        });
    }
}

impl fmt::Debug for InstallerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallerService")
            .field("settings", &self.settings)
            .field("safe_mode", &self.safe_mode.is_enabled())
            .field("resolved", &self.manifest.is_initialized())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use canopy_config::SessionSection;
    use canopy_installer::{Contributions, InstallerError, LibraryModule, LibraryRegistry, generator_fn};
    use canopy_storage::{MemoryBlobStore, StorageResult};
    use serde_json::{Value, json};

    use crate::requests::PackageResources;

    #[derive(Default)]
    struct Cdn(HashMap<String, Value>);

    #[async_trait]
    impl PackageResources for Cdn {
        async fn resource(&self, cdn_package: &str, _: &str, _: &str) -> StorageResult<Option<Value>> {
            Ok(self.0.get(cdn_package).cloned())
        }
    }

    fn cdn() -> Cdn {
        let mut cdn = Cdn::default();
        for (pkg, name) in [("@youwol/stories", "Stories"), ("@youwol/flux", "Flux")] {
            cdn.0.insert(pkg.into(), json!({ "cdnPackage": pkg, "displayName": name }));
        }
        cdn
    }

    struct Fixture {
        service: InstallerService,
        runs: Arc<AtomicUsize>,
        bus: EventBus,
        safe_mode: SafeMode,
    }

    fn fixture() -> Fixture {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let dev = generator_fn("youwolDev", move |installer| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(installer.with(Contributions::new().manifest(
                    Manifest::new("dev").with_applications(["@youwol/stories", "@youwol/ghost"]),
                )))
            }
        });
        let loader = Arc::new(
            LibraryRegistry::new().with_library(
                LibraryModule::new("@youwol/installers-youwol").export("youwolDev", dev),
            ),
        );

        let bus = EventBus::new();
        let safe_mode = SafeMode::new(false);
        let requests = RequestsExecutor::new(
            Arc::new(MemoryBlobStore::new()),
            Arc::new(cdn()),
            bus.clone(),
            &SessionSection::default(),
            &ApplicationsSection::default(),
        )
        .unwrap();
        let service = InstallerService::new(
            Arc::new(requests),
            loader,
            bus.clone(),
            safe_mode.clone(),
            &InstallerSection::default(),
            &ApplicationsSection::default(),
        );
        Fixture {
            service,
            runs,
            bus,
            safe_mode,
        }
    }

    fn user_script() -> ScriptSource {
        ScriptSource::declarative(
            r#"
            from_libraries = ["@youwol/installers-youwol.youwolDev"]

            [[manifests]]
            id = "mine"
            applications = ["@youwol/flux"]
            "#,
        )
    }

    #[tokio::test]
    async fn test_missing_script_uses_default() {
        let f = fixture();
        assert_eq!(f.service.installer_script().await.unwrap(), f.service.default_script());
    }

    #[tokio::test]
    async fn test_install_manifest_is_coalesced() {
        let f = fixture();
        let mut events = f.bus.subscribe();

        let (a, b) = tokio::join!(f.service.install_manifest(), f.service.install_manifest());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.id.ids(), vec!["dev"]);
        assert_eq!(f.runs.load(Ordering::SeqCst), 1);

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type(), "manifest_resolved");
    }

    #[tokio::test]
    async fn test_set_installer_script_persists_and_publishes() {
        let f = fixture();
        let mut manifests = f.service.subscribe_manifest();

        let manifest = f.service.set_installer_script(&user_script()).await.unwrap();
        assert_eq!(manifest.applications, vec!["@youwol/flux", "@youwol/stories", "@youwol/ghost"]);

        assert_eq!(f.service.installer_script().await.unwrap(), user_script());
        let published = manifests.next().await.unwrap();
        assert!(Arc::ptr_eq(&published, &manifest));
        assert!(Arc::ptr_eq(&f.service.install_manifest().await.unwrap(), &manifest));
    }

    #[tokio::test]
    async fn test_invalid_script_changes_nothing() {
        let f = fixture();
        let broken = ScriptSource::declarative("from_libraries = [\"@youwol/unknown.entry\"]");

        let err = f.service.set_installer_script(&broken).await.unwrap_err();
        assert!(matches!(err, ShellError::Installer(InstallerError::Loader(_))));
        assert_eq!(f.service.installer_script().await.unwrap(), f.service.default_script());
    }

    #[tokio::test]
    async fn test_try_installer_script_does_not_persist() {
        let f = fixture();
        let manifest = f.service.try_installer_script(&user_script()).await.unwrap();
        assert!(manifest.applications.contains(&"@youwol/flux".to_owned()));
        assert_eq!(f.service.installer_script().await.unwrap(), f.service.default_script());
    }

    #[tokio::test]
    async fn test_safe_mode_ignores_user_script() {
        let f = fixture();
        f.service.set_installer_script(&user_script()).await.unwrap();

        f.safe_mode.enable();
        assert_eq!(f.service.installer_script().await.unwrap(), f.service.default_script());
    }

    #[tokio::test]
    async fn test_applications_info_filters_missing_metadata() {
        let f = fixture();
        let infos = f.service.applications_info().await.unwrap();
        let names: Vec<_> = infos.iter().map(|i| i.display_name.as_str()).collect();
        assert_eq!(names, vec!["Stories"]);
    }

    #[tokio::test]
    async fn test_applications_info_follows_new_script() {
        let f = fixture();
        assert_eq!(f.service.applications_info().await.unwrap().len(), 1);

        f.service.set_installer_script(&user_script()).await.unwrap();
        let names: Vec<_> = f
            .service
            .applications_info()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.display_name)
            .collect();
        assert_eq!(names, vec!["Flux", "Stories"]);
    }
}
