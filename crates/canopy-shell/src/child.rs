//! The API an application uses to talk to the shell that started it.
//!
//! An application learns its instance id from the `instance-id` query
//! parameter of its own location. When it was started by a shell, the
//! shell's registry is its platform; otherwise it gets a
//! [`DetachedPlatform`] and starts further applications as pages.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use canopy_core::{InstanceId, Widget};
use canopy_platform::{
    DetachedPlatform, PlatformHandle, RunningApp, UrlScheme, WindowLauncher,
    instance_id_from_location,
};

/// Platform access for one application page.
#[derive(Clone)]
pub struct ChildApplicationApi {
    platform: Arc<dyn PlatformHandle>,
    location: String,
}

impl ChildApplicationApi {
    /// API for the page at `location`.
    ///
    /// Without a `parent`, pages are opened through `launcher` with
    /// `scheme`.
    #[must_use]
    pub fn new(
        parent: Option<Arc<dyn PlatformHandle>>,
        launcher: Arc<dyn WindowLauncher>,
        scheme: UrlScheme,
        location: impl Into<String>,
    ) -> Self {
        let platform = parent.unwrap_or_else(|| {
            debug!("no parent platform, running detached");
            Arc::new(DetachedPlatform::new(launcher).with_url_scheme(scheme))
        });
        Self {
            platform,
            location: location.into(),
        }
    }

    /// API for a page started by `parent`.
    #[must_use]
    pub fn embedded(parent: Arc<dyn PlatformHandle>, location: impl Into<String>) -> Self {
        Self {
            platform: parent,
            location: location.into(),
        }
    }

    /// The platform this page runs in.
    #[must_use]
    pub fn platform(&self) -> &Arc<dyn PlatformHandle> {
        &self.platform
    }

    /// Whether no shell started this page.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.platform.is_detached()
    }

    /// The page's location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// This page's instance id, if it was started as an instance.
    #[must_use]
    pub fn app_instance_id(&self) -> Option<InstanceId> {
        instance_id_from_location(&self.location)
    }

    /// This page's registry entry.
    #[must_use]
    pub fn running_app(&self) -> Option<Arc<RunningApp>> {
        self.platform.running_app(self.app_instance_id()?)
    }

    /// Publish the snippet shown for this instance.
    ///
    /// Returns `false` when the page is not a listed instance.
    pub fn set_properties(&self, snippet: Widget) -> bool {
        let Some(app) = self.running_app() else {
            debug!(location = %self.location, "set_properties: not a listed instance");
            return false;
        };
        app.set_snippet(snippet);
        true
    }
}

impl fmt::Debug for ChildApplicationApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildApplicationApi")
            .field("location", &self.location)
            .field("detached", &self.is_detached())
            .finish()
    }
}
