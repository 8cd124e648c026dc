//! User preferences: theme, profile and desktop layout.
//!
//! Preferences are persisted as a [`ScriptSource`] whose executable part is
//! a TOML document deserializing into [`Preferences`]. Widget slots accept
//! either a single view or a list of views.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info};

use canopy_core::{ReplayCache, ReplayReceiver, SafeMode, Widget};
use canopy_installer::ScriptSource;
use canopy_telemetry::RequestContext;

use crate::error::{ShellError, ShellResult};
use crate::requests::RequestsExecutor;

/// Preferences used when the user has none, and in safe mode.
pub const DEFAULT_PREFERENCES: &str = r##"css_theme = "not used for now"

[profile]
avatar = { class = "fas fa-user fa-2x" }

[desktop]
background_view = { class = "h-100 w-100", style = { backgroundColor = "#ffffff" } }
top_banner_view = { class = "text-center" }
widgets = [{ tag = "div", class = "canopy-desktop-favorites" }]
"##;

/// One view or several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Widgets {
    /// A list of views.
    Many(Vec<Widget>),
    /// A single view.
    One(Widget),
}

impl Widgets {
    /// The views as a list.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Widget> {
        match self {
            Self::Many(widgets) => widgets.clone(),
            Self::One(widget) => vec![widget.clone()],
        }
    }
}

impl Default for Widgets {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// User profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Avatar view.
    #[serde(default)]
    pub avatar: Widget,
}

/// Corporate branding shown in the top banner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Corporation {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Logo view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Widget>,
    /// Views next to the logo.
    #[serde(default)]
    pub widgets: Widgets,
}

/// Top banner layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopBanner {
    /// Banner views.
    #[serde(default)]
    pub widgets: Widgets,
    /// Corporate branding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corporation: Option<Corporation>,
}

/// Desktop layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Desktop {
    /// Background view.
    #[serde(default)]
    pub background_view: Widget,
    /// A view replacing the whole top banner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_banner_view: Option<Widget>,
    /// Views laid out on the desktop.
    #[serde(default)]
    pub widgets: Widgets,
    /// Structured top banner, used when no `top_banner_view` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_banner: Option<TopBanner>,
}

/// Resolved user preferences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Profile.
    #[serde(default)]
    pub profile: Profile,
    /// Theme stylesheet.
    #[serde(default)]
    pub css_theme: String,
    /// Desktop layout.
    #[serde(default)]
    pub desktop: Desktop,
}

impl Preferences {
    /// Parse a preferences document.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Preferences`] if `src` is not a valid document.
    pub fn parse(src: &str) -> ShellResult<Self> {
        toml::from_str(src).map_err(|e| ShellError::Preferences(e.to_string()))
    }
}

/// Read-side helpers over [`Preferences`].
pub struct PreferencesExtractor;

impl PreferencesExtractor {
    /// Views of the top banner: the replacing view if set, else the
    /// structured banner's views.
    #[must_use]
    pub fn top_banner_widgets(preferences: &Preferences) -> Vec<Widget> {
        if let Some(view) = &preferences.desktop.top_banner_view {
            return vec![view.clone()];
        }
        preferences
            .desktop
            .top_banner
            .as_ref()
            .map(|banner| banner.widgets.to_vec())
            .unwrap_or_default()
    }

    /// Views laid out on the desktop.
    #[must_use]
    pub fn desktop_widgets(preferences: &Preferences) -> Vec<Widget> {
        preferences.desktop.widgets.to_vec()
    }

    /// Views next to the corporate logo.
    #[must_use]
    pub fn corporation_widgets(preferences: &Preferences) -> Vec<Widget> {
        Self::corporation(preferences)
            .map(|corporation| corporation.widgets.to_vec())
            .unwrap_or_default()
    }

    /// Corporate branding, if any.
    #[must_use]
    pub fn corporation(preferences: &Preferences) -> Option<&Corporation> {
        preferences.desktop.top_banner.as_ref()?.corporation.as_ref()
    }
}

/// Loads, caches and replaces the user's preferences.
pub struct PreferencesService {
    requests: Arc<RequestsExecutor>,
    safe_mode: SafeMode,
    preferences: ReplayCache<Arc<Preferences>>,
}

impl PreferencesService {
    /// A service reading scripts through `requests`.
    #[must_use]
    pub fn new(requests: Arc<RequestsExecutor>, safe_mode: SafeMode) -> Self {
        Self {
            requests,
            safe_mode,
            preferences: ReplayCache::new(),
        }
    }

    /// The built-in preferences script.
    #[must_use]
    pub fn default_script() -> ScriptSource {
        ScriptSource::declarative(DEFAULT_PREFERENCES)
    }

    /// The script the session runs: the user's, unless in safe mode or
    /// missing or blank.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the persisted script cannot be read.
    pub async fn preferences_script(&self) -> ShellResult<ScriptSource> {
        if self.safe_mode.is_enabled() {
            debug!("safe mode: using default preferences");
            return Ok(Self::default_script());
        }
        match self.requests.preferences_script().await? {
            Some(script) if !script.is_blank() => Ok(script),
            _ => Ok(Self::default_script()),
        }
    }

    /// Evaluate `script` without persisting or publishing it.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Preferences`] if the script is invalid.
    pub fn try_preferences_script(script: &ScriptSource) -> ShellResult<Preferences> {
        Preferences::parse(&script.js_src)
    }

    /// The session preferences, evaluated once and shared by every caller.
    ///
    /// # Errors
    ///
    /// Returns the storage or evaluation error; the next call retries.
    pub async fn preferences(&self) -> ShellResult<Arc<Preferences>> {
        self.preferences
            .get_or_try_init(|| async {
                let script = self.preferences_script().await?;
                Ok::<_, ShellError>(Arc::new(Self::try_preferences_script(&script)?))
            })
            .await
    }

    /// Subscribe to the preferences and their replacements.
    #[must_use]
    pub fn subscribe(&self) -> ReplayReceiver<Arc<Preferences>> {
        self.preferences.subscribe()
    }

    /// Replace the user's preferences: evaluate, persist, then publish.
    ///
    /// # Errors
    ///
    /// Returns the evaluation error (nothing is persisted), or the storage
    /// error if the script could not be saved.
    pub async fn set_preferences_script(&self, script: &ScriptSource) -> ShellResult<Arc<Preferences>> {
        let ctx = RequestContext::new("preferences").with_operation("set_preferences_script");
        async {
            let preferences = Arc::new(Self::try_preferences_script(script)?);
            self.requests.save_preferences_script(script).await?;
            self.preferences.publish(Arc::clone(&preferences));
            info!("preferences replaced");
            Ok::<_, ShellError>(preferences)
        }
        .instrument(ctx.span())
        .await
    }
}

impl fmt::Debug for PreferencesService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferencesService")
            .field("safe_mode", &self.safe_mode.is_enabled())
            .field("loaded", &self.preferences.is_initialized())
            .finish_non_exhaustive()
    }
}
