//! Typed platform handles.
//!
//! Code that starts applications or broadcasts events depends on
//! [`PlatformHandle`], never on a concrete registry. A session embedded in
//! the shell hands out its [`PlatformState`]; code running with no shell
//! above it gets a [`DetachedPlatform`], which opens applications as
//! top-level pages instead.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use canopy_core::InstanceId;
use canopy_events::{EventBus, EventMetadata, EventReceiver, PlatformEvent, ShellEvent};

use crate::error::PlatformResult;
use crate::host::{Target, WindowLauncher};
use crate::running_app::{CreateInstance, RunningApp};
use crate::state::{ALL_BROADCASTS, PlatformState};
use crate::scheme::UrlScheme;

/// Outcome of [`PlatformHandle::create_instance`].
#[derive(Debug, Clone)]
pub enum Launch {
    /// Listed in a registry.
    Embedded(Arc<RunningApp>),
    /// Opened as a top-level page.
    Detached {
        /// The opened URL.
        url: String,
    },
}

impl Launch {
    /// The running instance, when embedded.
    #[must_use]
    pub fn running_app(&self) -> Option<&Arc<RunningApp>> {
        match self {
            Self::Embedded(app) => Some(app),
            Self::Detached { .. } => None,
        }
    }

    /// URL the application was started at.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Embedded(app) => app.url(),
            Self::Detached { url } => url,
        }
    }
}

/// What applications may ask of the platform they run in.
#[async_trait]
pub trait PlatformHandle: Send + Sync {
    /// Start an application.
    async fn create_instance(&self, request: CreateInstance) -> PlatformResult<Launch>;

    /// Broadcast to every listener of this platform.
    fn broadcast_event(&self, event: PlatformEvent) -> usize;

    /// Receive later broadcasts.
    fn subscribe_broadcasts(&self) -> EventReceiver;

    /// Listed instances, in creation order.
    fn running_applications(&self) -> Vec<Arc<RunningApp>>;

    /// The listed instance with this id.
    fn running_app(&self, instance_id: InstanceId) -> Option<Arc<RunningApp>> {
        self.running_applications()
            .into_iter()
            .find(|app| app.instance_id() == instance_id)
    }

    /// Whether this handle has no registry behind it.
    fn is_detached(&self) -> bool {
        false
    }
}

#[async_trait]
impl PlatformHandle for PlatformState {
    async fn create_instance(&self, request: CreateInstance) -> PlatformResult<Launch> {
        Ok(Launch::Embedded(PlatformState::create_instance(self, request).await))
    }

    fn broadcast_event(&self, event: PlatformEvent) -> usize {
        PlatformState::broadcast_event(self, event)
    }

    fn subscribe_broadcasts(&self) -> EventReceiver {
        PlatformState::subscribe_broadcasts(self)
    }

    fn running_applications(&self) -> Vec<Arc<RunningApp>> {
        PlatformState::running_applications(self)
    }

    fn running_app(&self, instance_id: InstanceId) -> Option<Arc<RunningApp>> {
        PlatformState::running_app(self, instance_id)
    }
}

/// Platform for code running outside the shell.
///
/// Applications open as top-level pages: in place when focus is
/// requested, in a new tab otherwise. Broadcasts go to a private bus that
/// only this handle's own subscribers see.
pub struct DetachedPlatform {
    launcher: Arc<dyn WindowLauncher>,
    scheme: UrlScheme,
    bus: EventBus,
}

impl DetachedPlatform {
    /// A detached platform opening pages through `launcher`.
    #[must_use]
    pub fn new(launcher: Arc<dyn WindowLauncher>) -> Self {
        Self {
            launcher,
            scheme: UrlScheme::default(),
            bus: EventBus::new(),
        }
    }

    /// Build URLs with another scheme.
    #[must_use]
    pub fn with_url_scheme(mut self, scheme: UrlScheme) -> Self {
        self.scheme = scheme;
        self
    }
}

#[async_trait]
impl PlatformHandle for DetachedPlatform {
    async fn create_instance(&self, request: CreateInstance) -> PlatformResult<Launch> {
        let url = self.scheme.app_url(
            &request.cdn_package,
            request.version_or_default(),
            &request.parameters,
        );
        let target = if request.focus {
            Target::SameWindow
        } else {
            Target::NewTab
        };
        info!(url = %url, target = ?target, "Opening application outside the shell");
        self.launcher.open(&url, target)?;
        Ok(Launch::Detached { url })
    }

    fn broadcast_event(&self, event: PlatformEvent) -> usize {
        self.bus.publish(ShellEvent::Broadcast {
            metadata: EventMetadata::new("detached-platform"),
            event,
        })
    }

    fn subscribe_broadcasts(&self) -> EventReceiver {
        self.bus.subscribe_topic(ALL_BROADCASTS)
    }

    fn running_applications(&self) -> Vec<Arc<RunningApp>> {
        Vec::new()
    }

    fn is_detached(&self) -> bool {
        true
    }
}

impl fmt::Debug for DetachedPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetachedPlatform")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Launcher(Mutex<Vec<(String, Target)>>);

    impl WindowLauncher for Launcher {
        fn open(&self, url: &str, target: Target) -> PlatformResult<()> {
            self.0.lock().unwrap().push((url.to_owned(), target));
            Ok(())
        }
    }

    struct Refusing;

    impl WindowLauncher for Refusing {
        fn open(&self, url: &str, _target: Target) -> PlatformResult<()> {
            Err(crate::PlatformError::Launch {
                url: url.to_owned(),
                message: "popup blocked".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_detached_focus_opens_same_window() {
        let launcher = Arc::new(Launcher::default());
        let platform = DetachedPlatform::new(launcher.clone());

        let launch = platform
            .create_instance(CreateInstance::new("p").with_focus(true))
            .await
            .unwrap();
        assert!(launch.running_app().is_none());
        platform
            .create_instance(CreateInstance::new("q").with_parameter("id", "1"))
            .await
            .unwrap();

        assert_eq!(
            *launcher.0.lock().unwrap(),
            vec![
                ("/applications/p/latest".to_owned(), Target::SameWindow),
                ("/applications/q/latest?id=1".to_owned(), Target::NewTab),
            ]
        );
        assert!(platform.is_detached());
        assert!(platform.running_applications().is_empty());
    }

    #[tokio::test]
    async fn test_detached_launch_error_propagates() {
        let platform = DetachedPlatform::new(Arc::new(Refusing));
        let err = platform
            .create_instance(CreateInstance::new("p"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("popup blocked"));
    }

    #[tokio::test]
    async fn test_detached_broadcast_is_private() {
        let shell_bus = EventBus::new();
        let mut shell_receiver = shell_bus.subscribe();
        let platform = DetachedPlatform::new(Arc::new(Launcher::default()));
        let mut own = platform.subscribe_broadcasts();

        assert_eq!(platform.broadcast_event(PlatformEvent::new("t", json!(null))), 1);
        assert!(own.try_recv().is_some());
        assert!(shell_receiver.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_state_through_handle() {
        let state = PlatformState::new(EventBus::new(), Arc::new(Launcher::default()));
        let handle: &dyn PlatformHandle = &state;

        let launch = handle
            .create_instance(CreateInstance::new("p").with_focus(true))
            .await
            .unwrap();
        let app = launch.running_app().unwrap();

        assert!(!handle.is_detached());
        assert_eq!(launch.url(), app.url());
        assert!(handle.running_app(app.instance_id()).is_some());
        assert_eq!(state.focused_id(), Some(app.instance_id()));
    }
}
