//! Config file discovery and layered loading.
//!
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge `<config_dir>/canopy/config.toml` (user), if present
//! 3. Merge the explicit file, if one was given
//! 4. Apply `CANOPY_*` environment overrides
//! 5. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Inputs of one layered load.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// User-level config file. `None` skips the user layer.
    pub user_file: Option<PathBuf>,
    /// Explicit config file, merged over the user layer.
    pub explicit_file: Option<PathBuf>,
    /// Environment snapshot used for overrides.
    pub env_vars: HashMap<String, String>,
}

impl LoadOptions {
    /// Options for the running process: the platform config directory and
    /// the real environment.
    #[must_use]
    pub fn discover(explicit_file: Option<&Path>) -> Self {
        Self {
            user_file: user_config_path(),
            explicit_file: explicit_file.map(Path::to_path_buf),
            env_vars: collect_env_vars(),
        }
    }
}

/// Load the layered configuration.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file is unreadable or malformed, an
/// override cannot be applied, or the result fails validation.
pub fn load(options: &LoadOptions) -> ConfigResult<Config> {
    let mut merged = parse_toml(DEFAULTS_TOML, "<embedded defaults>")?;

    if let Some(path) = &options.user_file
        && let Some(overlay) = try_load_file(path)?
    {
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded user config");
    }

    if let Some(path) = &options.explicit_file {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded config file");
    }

    let applied = apply_env_overrides(&mut merged, &options.env_vars)?;
    if applied > 0 {
        debug!(count = applied, "applied environment overrides");
    }

    finish(merged, "<merged config>")
}

/// Load defaults overlaid with an in-memory TOML document. No environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the document is malformed or the result
/// fails validation.
pub fn load_str(content: &str) -> ConfigResult<Config> {
    let mut merged = parse_toml(DEFAULTS_TOML, "<embedded defaults>")?;
    let overlay = parse_toml(content, "<inline>")?;
    deep_merge(&mut merged, &overlay);
    finish(merged, "<inline>")
}

fn finish(merged: toml::Value, label: &str) -> ConfigResult<Config> {
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: label.to_owned(),
                source: e,
            })?;
    validate::validate(&config)?;
    Ok(config)
}

fn parse_toml(content: &str, label: &str) -> ConfigResult<toml::Value> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: label.to_owned(),
        source: e,
    })
}

/// Read a file, returning `None` if it does not exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    parse_toml(&content, &path.display().to_string()).map(Some)
}

/// `<config_dir>/canopy/config.toml` for the current user.
fn user_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("canopy").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_deserialize_to_default_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_with_no_layers() {
        let config = load(&LoadOptions::default()).unwrap();
        assert_eq!(config.installer.max_depth, 100);
        assert_eq!(config.session.owner_package, "@youwol/os-core");
    }

    #[test]
    fn test_layer_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let user = write_file(
            dir.path(),
            "user.toml",
            "[installer]\nmax_depth = 20\n[events]\ncapacity = 64\n",
        );
        let explicit = write_file(dir.path(), "explicit.toml", "[installer]\nmax_depth = 30\n");

        let options = LoadOptions {
            user_file: Some(user),
            explicit_file: Some(explicit),
            env_vars: [("CANOPY_EVENTS_CAPACITY".to_owned(), "128".to_owned())]
                .into_iter()
                .collect(),
        };
        let config = load(&options).unwrap();

        assert_eq!(config.installer.max_depth, 30);
        assert_eq!(config.events.capacity, 128);
    }

    #[test]
    fn test_missing_user_file_is_skipped() {
        let options = LoadOptions {
            user_file: Some(PathBuf::from("/nonexistent/canopy/config.toml")),
            ..LoadOptions::default()
        };
        assert!(load(&options).is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let options = LoadOptions {
            explicit_file: Some(PathBuf::from("/nonexistent/explicit.toml")),
            ..LoadOptions::default()
        };
        assert!(matches!(load(&options), Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "bad.toml", "[installer\n");
        let options = LoadOptions {
            explicit_file: Some(path),
            ..LoadOptions::default()
        };
        assert!(matches!(load(&options), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_str_validates() {
        assert!(load_str("[events]\ncapacity = 0\n").is_err());
        let config = load_str("[session]\nsafe_mode = true\n").unwrap();
        assert!(config.session.safe_mode);
    }
}
