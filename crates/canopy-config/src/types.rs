//! Configuration types for the Canopy shell.
//!
//! Every struct implements [`Default`] with the values of the embedded
//! `defaults.toml`, so a partial file (or a bare `[section]` header) still
//! produces a working configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persisted-document names and session flags.
    pub session: SessionSection,
    /// Manifest resolution settings.
    pub installer: InstallerSection,
    /// Application URL scheme.
    pub applications: ApplicationsSection,
    /// Event bus settings.
    pub events: EventsSection,
    /// Logging level, format and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

/// Where the shell's per-user documents live in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Package owning the shell's blobs.
    pub owner_package: String,
    /// Data name of the favorites bag.
    pub favorites_data: String,
    /// Data name of the installer script.
    pub installer_data: String,
    /// Data name of the preferences script.
    pub preferences_data: String,
    /// Data name of the marker recording which default favorites were
    /// already applied.
    pub default_favorites_data: String,
    /// Start in safe mode: user scripts are ignored in favor of defaults.
    pub safe_mode: bool,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            owner_package: "@youwol/os-core".to_owned(),
            favorites_data: "favorites".to_owned(),
            installer_data: "installer".to_owned(),
            preferences_data: "preferences".to_owned(),
            default_favorites_data: "favorites-defaults".to_owned(),
            safe_mode: false,
        }
    }
}

// ---------------------------------------------------------------------------
// [installer]
// ---------------------------------------------------------------------------

/// Manifest resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerSection {
    /// Recursion depth at which resolution fails.
    pub max_depth: u32,
    /// Libraries installed by the default installer script
    /// (`<package>.<export.path>`).
    pub default_libraries: Vec<String>,
}

impl Default for InstallerSection {
    fn default() -> Self {
        Self {
            max_depth: 100,
            default_libraries: vec!["@youwol/installers-youwol.youwolDev".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// [applications]
// ---------------------------------------------------------------------------

/// How application packages map to URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationsSection {
    /// Path prefix under which packages are served.
    pub url_prefix: String,
    /// Resource holding an application's metadata.
    pub metadata_resource: String,
    /// Version used when none is given.
    pub default_version: String,
}

impl Default for ApplicationsSection {
    fn default() -> Self {
        Self {
            url_prefix: "/applications".to_owned(),
            metadata_resource: ".yw_metadata.json".to_owned(),
            default_version: "latest".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// [events]
// ---------------------------------------------------------------------------

/// Event bus settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsSection {
    /// Broadcast channel capacity.
    pub capacity: usize,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Output format: `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Per-target overrides, e.g. `canopy_installer=debug`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
