//! Bridge from `canopy_config::Config` to domain types.
//!
//! The config crate depends on no other canopy crate; translation into
//! telemetry and platform settings happens here, once per session.

use canopy_config::Config;
use canopy_platform::UrlScheme;
use canopy_telemetry::{LogConfig, LogFormat, setup_logging};

use crate::error::ShellResult;

/// Convert config to [`LogConfig`].
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    let format = match cfg.logging.format.to_ascii_lowercase().as_str() {
        "pretty" => LogFormat::Pretty,
        "json" => LogFormat::Json,
        "full" => LogFormat::Full,
        _ => LogFormat::Compact,
    };

    let mut log_config =
        LogConfig::new(cfg.logging.level.to_ascii_lowercase()).with_format(format);

    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }

    log_config
}

/// Convert config to the application [`UrlScheme`].
#[must_use]
pub fn to_url_scheme(cfg: &Config) -> UrlScheme {
    UrlScheme::new(cfg.applications.url_prefix.as_str())
}

/// Install the global log subscriber described by `cfg`.
///
/// # Errors
///
/// Returns a telemetry error if a directive is invalid or a subscriber is
/// already installed.
pub fn init_logging(cfg: &Config) -> ShellResult<()> {
    setup_logging(&to_log_config(cfg))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_from_logging_section() {
        let cfg = Config::from_toml_str(
            r#"
            [logging]
            level = "DEBUG"
            format = "json"
            directives = ["canopy_installer=trace"]
            "#,
        )
        .unwrap();

        let log = to_log_config(&cfg);
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.directives, vec!["canopy_installer=trace"]);
    }

    #[test]
    fn test_default_format_is_compact() {
        assert_eq!(to_log_config(&Config::default()).format, LogFormat::Compact);
    }

    #[test]
    fn test_url_scheme_from_prefix() {
        let cfg = Config::from_toml_str("[applications]\nurl_prefix = \"/apps/\"\n").unwrap();
        assert_eq!(to_url_scheme(&cfg).prefix(), "/apps");
    }
}
