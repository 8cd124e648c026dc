//! The application registry.
//!
//! [`PlatformState`] owns every [`RunningApp`] of a session, in creation
//! order, and the single focus slot. Each instance moves through
//! `created → listed → {background ⇄ focused} → closed`; at most one
//! instance is focused at any time.
//!
//! Operations on an id that is not listed (e.g. an instance closed
//! concurrently) are logged and ignored: they return `false` and change
//! nothing.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use canopy_core::{InstanceId, ReplayLatest, ReplayReceiver};
use canopy_events::{EventBus, EventMetadata, EventReceiver, PlatformEvent, ShellEvent};

use crate::error::PlatformResult;
use crate::host::{FrameHost, MetadataSource, NoFrameHost, Target, WindowLauncher};
use crate::running_app::{CreateInstance, RunningApp, TopBannerViews};
use crate::scheme::UrlScheme;

const EVENT_SOURCE: &str = "platform";

/// Topic pattern matching every broadcast.
pub(crate) const ALL_BROADCASTS: &str = "*";

/// Registry of the running applications of one session.
pub struct PlatformState {
    running: ReplayLatest<Vec<Arc<RunningApp>>>,
    focused: ReplayLatest<Option<InstanceId>>,
    bus: EventBus,
    scheme: UrlScheme,
    launcher: Arc<dyn WindowLauncher>,
    frames: Arc<dyn FrameHost>,
    metadata: Option<Arc<dyn MetadataSource>>,
}

impl PlatformState {
    /// An empty registry publishing on `bus` and expanding instances
    /// through `launcher`.
    #[must_use]
    pub fn new(bus: EventBus, launcher: Arc<dyn WindowLauncher>) -> Self {
        Self {
            running: ReplayLatest::with_value(Vec::new()),
            focused: ReplayLatest::with_value(None),
            bus,
            scheme: UrlScheme::default(),
            launcher,
            frames: Arc::new(NoFrameHost),
            metadata: None,
        }
    }

    /// Serve instances under another URL scheme.
    #[must_use]
    pub fn with_url_scheme(mut self, scheme: UrlScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Release frames through `frames`.
    #[must_use]
    pub fn with_frame_host(mut self, frames: Arc<dyn FrameHost>) -> Self {
        self.frames = frames;
        self
    }

    /// Fetch metadata of new instances from `source`.
    #[must_use]
    pub fn with_metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata = Some(source);
        self
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// List a new instance, focusing it if requested.
    ///
    /// Metadata is not fetched; see [`create_instance`](Self::create_instance).
    pub fn register(&self, request: CreateInstance) -> Arc<RunningApp> {
        let focus = request.focus;
        let app = Arc::new(RunningApp::new(request, &self.scheme));
        let instance_id = app.instance_id();

        self.running.modify(|apps| apps.push(Arc::clone(&app)));
        info!(
            instance_id = %instance_id,
            cdn_package = %app.cdn_package(),
            version = %app.version(),
            "Application instance created"
        );
        self.bus.publish(ShellEvent::InstanceCreated {
            metadata: EventMetadata::new(EVENT_SOURCE),
            instance_id,
            cdn_package: app.cdn_package().to_owned(),
        });

        if focus {
            self.focus(instance_id);
        }
        app
    }

    /// List a new instance, then fetch its metadata.
    ///
    /// The instance is listed (and focused) before the first suspension
    /// point. Missing metadata leaves the metadata, header and snippet
    /// channels empty.
    pub async fn create_instance(&self, request: CreateInstance) -> Arc<RunningApp> {
        let app = self.register(request);
        if let Some(source) = &self.metadata {
            match source
                .application_info(app.cdn_package(), app.version())
                .await
            {
                Some(info) => app.set_metadata(info),
                None => debug!(
                    instance_id = %app.instance_id(),
                    cdn_package = %app.cdn_package(),
                    "No metadata for application"
                ),
            }
        }
        app
    }

    /// Focus a listed instance, demoting the previously focused one.
    pub fn focus(&self, instance_id: InstanceId) -> bool {
        if self.running_app(instance_id).is_none() {
            debug!(instance_id = %instance_id, "Ignoring focus of unknown instance");
            return false;
        }
        self.focused.publish(Some(instance_id));
        self.bus.publish(ShellEvent::InstanceFocused {
            metadata: EventMetadata::new(EVENT_SOURCE),
            instance_id,
        });
        true
    }

    /// Terminate an instance and remove it from the list.
    ///
    /// Focus is cleared if the instance held it. A frame that fails to
    /// release is logged; the instance is removed regardless.
    pub fn close(&self, instance_id: InstanceId) -> bool {
        let Some(app) = self.running_app(instance_id) else {
            debug!(instance_id = %instance_id, "Ignoring close of unknown instance");
            return false;
        };

        if let Err(e) = app.terminate(self.frames.as_ref()) {
            warn!(instance_id = %instance_id, error = %e, "Failed to release instance frame");
        }
        self.running
            .modify(|apps| apps.retain(|a| a.instance_id() != instance_id));
        if self.focused_id() == Some(instance_id) {
            self.focused.publish(None);
        }

        info!(instance_id = %instance_id, "Application instance closed");
        self.bus.publish(ShellEvent::InstanceClosed {
            metadata: EventMetadata::new(EVENT_SOURCE),
            instance_id,
        });
        true
    }

    /// Clear focus, keeping the instance listed.
    pub fn minimize(&self, instance_id: InstanceId) -> bool {
        if self.running_app(instance_id).is_none() {
            debug!(instance_id = %instance_id, "Ignoring minimize of unknown instance");
            return false;
        }
        self.focused.publish(None);
        self.bus.publish(ShellEvent::InstanceMinimized {
            metadata: EventMetadata::new(EVENT_SOURCE),
            instance_id,
        });
        true
    }

    /// Open the instance's URL in a new top-level context.
    ///
    /// The embedded instance is left untouched.
    ///
    /// # Errors
    ///
    /// Propagates the launcher's error.
    pub fn expand(&self, instance_id: InstanceId) -> PlatformResult<bool> {
        let Some(app) = self.running_app(instance_id) else {
            debug!(instance_id = %instance_id, "Ignoring expand of unknown instance");
            return Ok(false);
        };
        self.launcher.open(app.url(), Target::NewTab)?;
        Ok(true)
    }

    /// Push banner widgets to an instance.
    pub fn set_top_banner_views(&self, instance_id: InstanceId, views: TopBannerViews) -> bool {
        match self.running_app(instance_id) {
            Some(app) => {
                app.set_top_banner_views(views);
                true
            },
            None => {
                debug!(instance_id = %instance_id, "Ignoring banner views of unknown instance");
                false
            },
        }
    }

    // -----------------------------------------------------------------
    // Broadcast
    // -----------------------------------------------------------------

    /// Broadcast to the shell and every instance.
    ///
    /// Returns the number of receivers.
    pub fn broadcast_event(&self, event: PlatformEvent) -> usize {
        debug!(topic = %event.topic, "Broadcasting platform event");
        self.bus.publish(ShellEvent::Broadcast {
            metadata: EventMetadata::new(EVENT_SOURCE),
            event,
        })
    }

    /// Receive every later broadcast.
    #[must_use]
    pub fn subscribe_broadcasts(&self) -> EventReceiver {
        self.bus.subscribe_topic(ALL_BROADCASTS)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// The listed instance with this id.
    #[must_use]
    pub fn running_app(&self, instance_id: InstanceId) -> Option<Arc<RunningApp>> {
        self.running_applications()
            .into_iter()
            .find(|app| app.instance_id() == instance_id)
    }

    /// Listed instances, in creation order.
    #[must_use]
    pub fn running_applications(&self) -> Vec<Arc<RunningApp>> {
        self.running.latest().unwrap_or_default()
    }

    /// Id of the focused instance.
    #[must_use]
    pub fn focused_id(&self) -> Option<InstanceId> {
        self.focused.latest().flatten()
    }

    /// The focused instance.
    #[must_use]
    pub fn focused(&self) -> Option<Arc<RunningApp>> {
        self.focused_id().and_then(|id| self.running_app(id))
    }

    /// Follow the running list.
    #[must_use]
    pub fn subscribe_running(&self) -> ReplayReceiver<Vec<Arc<RunningApp>>> {
        self.running.subscribe()
    }

    /// Follow the focus slot.
    #[must_use]
    pub fn subscribe_focused(&self) -> ReplayReceiver<Option<InstanceId>> {
        self.focused.subscribe()
    }

    /// The session's event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// URL scheme of the instances.
    #[must_use]
    pub fn url_scheme(&self) -> &UrlScheme {
        &self.scheme
    }
}

impl fmt::Debug for PlatformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformState")
            .field("running", &self.running_applications().len())
            .field("focused", &self.focused_id())
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}
