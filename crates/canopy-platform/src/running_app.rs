//! Running application instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;

use canopy_core::{ApplicationInfo, InstanceId, ReplayLatest, Widget};

use crate::error::PlatformResult;
use crate::host::{FrameHandle, FrameHost};
use crate::scheme::{DEFAULT_VERSION, UrlScheme};

/// Request to start an application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateInstance {
    /// Package to run.
    pub cdn_package: String,
    /// Version; `"latest"` when unset.
    pub version: Option<String>,
    /// Instance parameters.
    pub parameters: BTreeMap<String, String>,
    /// Whether the new instance takes focus.
    pub focus: bool,
    /// Optional window title.
    pub title: Option<String>,
}

impl CreateInstance {
    /// Run the latest version of `cdn_package` in the background.
    #[must_use]
    pub fn new(cdn_package: impl Into<String>) -> Self {
        Self {
            cdn_package: cdn_package.into(),
            ..Self::default()
        }
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Add one parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Add several parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Set whether the instance takes focus.
    #[must_use]
    pub fn with_focus(mut self, focus: bool) -> Self {
        self.focus = focus;
        self
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The requested version, or the default one.
    #[must_use]
    pub fn version_or_default(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }
}

/// Widgets an instance contributes to the shell's top banner.
///
/// Unset entries leave the corresponding channel untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TopBannerViews {
    /// Action buttons.
    pub actions: Option<Widget>,
    /// User menu.
    pub user_menu: Option<Widget>,
    /// Corporation menu.
    pub corporation_menu: Option<Widget>,
}

impl TopBannerViews {
    /// Set the actions view.
    #[must_use]
    pub fn with_actions(mut self, widget: Widget) -> Self {
        self.actions = Some(widget);
        self
    }

    /// Set the user menu.
    #[must_use]
    pub fn with_user_menu(mut self, widget: Widget) -> Self {
        self.user_menu = Some(widget);
        self
    }

    /// Set the corporation menu.
    #[must_use]
    pub fn with_corporation_menu(mut self, widget: Widget) -> Self {
        self.corporation_menu = Some(widget);
        self
    }
}

/// One live instance of an embedded application.
///
/// Identity, package, version, parameters and URL are fixed at creation.
/// Everything the shell renders around the instance (frame, banner
/// widgets, header, snippet, metadata) lives in its own replay channel.
pub struct RunningApp {
    instance_id: InstanceId,
    cdn_package: String,
    version: String,
    parameters: BTreeMap<String, String>,
    title: Option<String>,
    url: String,

    iframe: ReplayLatest<FrameHandle>,
    top_banner_actions: ReplayLatest<Widget>,
    top_banner_user_menu: ReplayLatest<Widget>,
    top_banner_corporation_menu: ReplayLatest<Widget>,
    header: ReplayLatest<Widget>,
    snippet: ReplayLatest<Widget>,
    metadata: ReplayLatest<ApplicationInfo>,

    terminated: AtomicBool,
}

impl RunningApp {
    /// Create an instance with a fresh id.
    #[must_use]
    pub fn new(request: CreateInstance, scheme: &UrlScheme) -> Self {
        let instance_id = InstanceId::new();
        let version = request.version_or_default().to_owned();
        let url = scheme.instance_url(
            &request.cdn_package,
            &version,
            instance_id,
            &request.parameters,
        );
        Self {
            instance_id,
            cdn_package: request.cdn_package,
            version,
            parameters: request.parameters,
            title: request.title,
            url,
            iframe: ReplayLatest::new(),
            top_banner_actions: ReplayLatest::new(),
            top_banner_user_menu: ReplayLatest::new(),
            top_banner_corporation_menu: ReplayLatest::new(),
            header: ReplayLatest::new(),
            snippet: ReplayLatest::new(),
            metadata: ReplayLatest::new(),
            terminated: AtomicBool::new(false),
        }
    }

    /// Instance id.
    #[must_use]
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Package the instance runs.
    #[must_use]
    pub fn cdn_package(&self) -> &str {
        &self.cdn_package
    }

    /// Version the instance runs.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Instance parameters.
    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Title given at creation.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Instance URL, including the `instance-id` parameter.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Frame channel.
    #[must_use]
    pub fn iframe(&self) -> &ReplayLatest<FrameHandle> {
        &self.iframe
    }

    /// Top-banner actions channel.
    #[must_use]
    pub fn top_banner_actions(&self) -> &ReplayLatest<Widget> {
        &self.top_banner_actions
    }

    /// Top-banner user menu channel.
    #[must_use]
    pub fn top_banner_user_menu(&self) -> &ReplayLatest<Widget> {
        &self.top_banner_user_menu
    }

    /// Top-banner corporation menu channel.
    #[must_use]
    pub fn top_banner_corporation_menu(&self) -> &ReplayLatest<Widget> {
        &self.top_banner_corporation_menu
    }

    /// Header channel.
    #[must_use]
    pub fn header(&self) -> &ReplayLatest<Widget> {
        &self.header
    }

    /// Snippet channel.
    #[must_use]
    pub fn snippet(&self) -> &ReplayLatest<Widget> {
        &self.snippet
    }

    /// Metadata channel.
    #[must_use]
    pub fn metadata(&self) -> &ReplayLatest<ApplicationInfo> {
        &self.metadata
    }

    /// Record that the renderer mounted the instance's frame.
    pub fn attach_frame(&self) -> FrameHandle {
        let frame = FrameHandle {
            instance_id: self.instance_id,
            src: self.url.clone(),
        };
        self.iframe.publish(frame.clone());
        frame
    }

    /// Replace the snippet shown for this instance.
    pub fn set_snippet(&self, snippet: Widget) {
        self.snippet.publish(snippet);
    }

    /// Publish the banner widgets that are set.
    pub fn set_top_banner_views(&self, views: TopBannerViews) {
        if let Some(actions) = views.actions {
            self.top_banner_actions.publish(actions);
        }
        if let Some(user_menu) = views.user_menu {
            self.top_banner_user_menu.publish(user_menu);
        }
        if let Some(corporation_menu) = views.corporation_menu {
            self.top_banner_corporation_menu.publish(corporation_menu);
        }
    }

    /// Publish fetched metadata, with the header and default snippet
    /// derived from it.
    ///
    /// A snippet already set by the application is kept.
    pub fn set_metadata(&self, info: ApplicationInfo) {
        let name = info.display_name.clone();
        self.snippet.publish_if_empty(Widget::text(name.as_str()));
        self.header.publish(Widget::from_value(json!({
            "tag": "div",
            "class": "px-1 d-flex flex-column",
            "title": self.title.as_deref().unwrap_or(&name),
            "innerText": name,
        })));
        self.metadata.publish(info);
    }

    /// Release the instance's frame. Later calls do nothing.
    ///
    /// # Errors
    ///
    /// Propagates the frame host's error.
    pub fn terminate(&self, host: &dyn FrameHost) -> PlatformResult<()> {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        match self.iframe.latest() {
            Some(frame) => host.release(&frame),
            None => Ok(()),
        }
    }

    /// Whether [`terminate`](Self::terminate) has run.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for RunningApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningApp")
            .field("instance_id", &self.instance_id)
            .field("cdn_package", &self.cdn_package)
            .field("version", &self.version)
            .field("url", &self.url)
            .field("terminated", &self.is_terminated())
            .finish_non_exhaustive()
    }
}
