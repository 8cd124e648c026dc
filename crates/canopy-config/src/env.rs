//! `CANOPY_*` environment overrides.
//!
//! Environment variables are applied last and replace whatever the file
//! layers set.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "CANOPY_OWNER_PACKAGE",
        field_path: "session.owner_package",
    },
    EnvMapping {
        var_name: "CANOPY_SAFE_MODE",
        field_path: "session.safe_mode",
    },
    EnvMapping {
        var_name: "CANOPY_INSTALLER_MAX_DEPTH",
        field_path: "installer.max_depth",
    },
    EnvMapping {
        var_name: "CANOPY_APPLICATIONS_PREFIX",
        field_path: "applications.url_prefix",
    },
    EnvMapping {
        var_name: "CANOPY_EVENTS_CAPACITY",
        field_path: "events.capacity",
    },
    EnvMapping {
        var_name: "CANOPY_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "CANOPY_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Snapshot of the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Apply every known `CANOPY_*` variable present in `env_vars`.
///
/// The value is parsed according to the type already present at the target
/// field (integer, boolean or string).
///
/// Returns the number of overrides applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a value cannot be parsed as the
/// field's type.
pub fn apply_env_overrides<S: BuildHasher>(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env override"
        );
        set_field(merged, mapping.field_path, raw).map_err(|message| ConfigError::EnvError {
            var_name: mapping.var_name.to_owned(),
            message,
        })?;
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn set_field(root: &mut toml::Value, path: &str, raw: &str) -> Result<(), String> {
    let mut parts: Vec<&str> = path.split('.').collect();
    let Some(leaf) = parts.pop() else {
        return Err(format!("empty field path '{path}'"));
    };

    let mut node = root;
    for part in parts {
        let toml::Value::Table(table) = node else {
            return Err(format!("'{part}' is not a table"));
        };
        node = table
            .entry(part.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    let toml::Value::Table(table) = node else {
        return Err(format!("parent of '{leaf}' is not a table"));
    };

    let value = match table.get(leaf) {
        Some(toml::Value::Integer(_)) => raw
            .trim()
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|e| format!("expected an integer: {e}"))?,
        Some(toml::Value::Boolean(_)) => parse_bool(raw)
            .map(toml::Value::Boolean)
            .ok_or_else(|| format!("expected a boolean, got '{raw}'"))?,
        _ => toml::Value::String(raw.to_owned()),
    };
    table.insert(leaf.to_owned(), value);
    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
