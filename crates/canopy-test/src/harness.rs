//! A session wired to mocks.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use canopy_config::Config;
use canopy_installer::{LibraryModule, LibraryRegistry};
use canopy_shell::{Environment, ShellResult};

use crate::mocks::{
    FlakyBlobStore, MockEntityResolver, MockMetadataSource, RecordingFrameHost, RecordingLauncher,
};

/// An [`Environment`] together with the mocks behind it.
pub struct TestShell {
    /// The session.
    pub env: Arc<Environment>,
    /// Remote blob store.
    pub store: Arc<FlakyBlobStore>,
    /// Explorer.
    pub explorer: Arc<MockEntityResolver>,
    /// Application package resources.
    pub cdn: Arc<MockMetadataSource>,
    /// Library loader.
    pub libraries: Arc<LibraryRegistry>,
    /// Page launcher.
    pub launcher: Arc<RecordingLauncher>,
    /// Frame host.
    pub frames: Arc<RecordingFrameHost>,
}

/// Builds a [`TestShell`].
#[derive(Default)]
pub struct TestShellBuilder {
    config: Config,
    store: Option<Arc<FlakyBlobStore>>,
    explorer: MockEntityResolver,
    cdn: MockMetadataSource,
    libraries: Vec<LibraryModule>,
}

impl TestShellBuilder {
    /// Use `config` instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Share an existing store, e.g. to start a second session.
    #[must_use]
    pub fn store(mut self, store: Arc<FlakyBlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a prepared explorer.
    #[must_use]
    pub fn explorer(mut self, explorer: MockEntityResolver) -> Self {
        self.explorer = explorer;
        self
    }

    /// Use prepared package metadata.
    #[must_use]
    pub fn cdn(mut self, cdn: MockMetadataSource) -> Self {
        self.cdn = cdn;
        self
    }

    /// Register a library with the loader.
    #[must_use]
    pub fn library(mut self, module: LibraryModule) -> Self {
        self.libraries.push(module);
        self
    }

    /// Assemble the session.
    ///
    /// # Errors
    ///
    /// Returns the environment builder's error.
    pub fn build(self) -> ShellResult<TestShell> {
        let store = self.store.unwrap_or_default();
        let explorer = Arc::new(self.explorer);
        let cdn = Arc::new(self.cdn);
        let libraries = Arc::new(
            self.libraries
                .into_iter()
                .fold(LibraryRegistry::new(), LibraryRegistry::with_library),
        );
        let launcher = Arc::new(RecordingLauncher::new());
        let frames = Arc::new(RecordingFrameHost::new());

        let env = Environment::builder(self.config)
            .blob_store(store.clone())
            .package_resources(cdn.clone())
            .module_loader(libraries.clone())
            .entity_resolver(explorer.clone())
            .window_launcher(launcher.clone())
            .frame_host(frames.clone())
            .build()?;

        Ok(TestShell {
            env,
            store,
            explorer,
            cdn,
            libraries,
            launcher,
            frames,
        })
    }
}

impl TestShell {
    /// Start building a session.
    #[must_use]
    pub fn builder() -> TestShellBuilder {
        TestShellBuilder::default()
    }

    /// Owner package of the session's documents.
    #[must_use]
    pub fn owner_package(&self) -> &str {
        &self.env.config().session.owner_package
    }
}

/// Route test logs through the test writer. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}
