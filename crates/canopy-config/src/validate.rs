//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_session(config)?;
    validate_installer(config)?;
    validate_applications(config)?;
    validate_events(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_session(config: &Config) -> ConfigResult<()> {
    let s = &config.session;
    let names = [
        ("session.owner_package", &s.owner_package),
        ("session.favorites_data", &s.favorites_data),
        ("session.installer_data", &s.installer_data),
        ("session.preferences_data", &s.preferences_data),
        ("session.default_favorites_data", &s.default_favorites_data),
    ];
    for (field, value) in names {
        if value.trim().is_empty() {
            return Err(invalid(field, "must not be empty"));
        }
    }

    // Marker and bag are distinct blobs.
    if s.default_favorites_data == s.favorites_data {
        return Err(invalid(
            "session.default_favorites_data",
            "must differ from session.favorites_data",
        ));
    }
    Ok(())
}

fn validate_installer(config: &Config) -> ConfigResult<()> {
    let i = &config.installer;
    if i.max_depth == 0 {
        return Err(invalid("installer.max_depth", "must be at least 1"));
    }
    for lib in &i.default_libraries {
        match lib.split_once('.') {
            Some((package, path)) if !package.is_empty() && !path.is_empty() => {},
            _ => {
                return Err(invalid(
                    "installer.default_libraries",
                    format!("'{lib}' is not of the form <package>.<export.path>"),
                ));
            },
        }
    }
    Ok(())
}

fn validate_applications(config: &Config) -> ConfigResult<()> {
    let a = &config.applications;
    if !a.url_prefix.starts_with('/') {
        return Err(invalid("applications.url_prefix", "must start with '/'"));
    }
    if a.default_version.trim().is_empty() {
        return Err(invalid("applications.default_version", "must not be empty"));
    }
    if a.metadata_resource.trim().is_empty() {
        return Err(invalid("applications.metadata_resource", "must not be empty"));
    }
    Ok(())
}

fn validate_events(config: &Config) -> ConfigResult<()> {
    if config.events.capacity == 0 {
        return Err(invalid("events.capacity", "must be at least 1"));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;
    if !LOG_LEVELS.contains(&l.level.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.level",
            format!("unknown level '{}'; expected one of {LOG_LEVELS:?}", l.level),
        ));
    }
    if !LOG_FORMATS.contains(&l.format.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.format",
            format!("unknown format '{}'; expected one of {LOG_FORMATS:?}", l.format),
        ));
    }
    Ok(())
}
