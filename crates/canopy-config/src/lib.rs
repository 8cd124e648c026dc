#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for the Canopy shell.
//!
//! # Usage
//!
//! ```rust,no_run
//! use canopy_config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("blobs owned by {}", config.session.owner_package);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. `CANOPY_*` environment variables
//! 2. An explicit file passed to [`Config::load`]
//! 3. The user file (`<config_dir>/canopy/config.toml`)
//! 4. Embedded defaults (`defaults.toml` compiled into the crate)
//!
//! This crate has no dependencies on other canopy crates; conversion into
//! domain settings happens where the session is assembled.

/// Environment variable overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layer merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::LoadOptions;
pub use types::*;

impl Config {
    /// Load the layered configuration for the running process.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file is malformed, an environment
    /// override is invalid, or the result fails validation.
    pub fn load(explicit_file: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(&LoadOptions::discover(explicit_file))
    }

    /// Load defaults overlaid with an in-memory TOML document.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the document is malformed or fails
    /// validation.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        loader::load_str(content)
    }
}
