//! Canopy Shell - the session environment of the Canopy desktop shell.
//!
//! Wires the subsystems of one top-level session together:
//!
//! - [`Environment`]: the shared session context, built once by
//!   [`EnvironmentBuilder`] and handed out as `Arc<Environment>`
//! - [`RequestsExecutor`]: typed access to the persisted documents and to
//!   application metadata
//! - [`InstallerService`] and [`PreferencesService`]: user scripts, their
//!   defaults and their cached results
//! - [`ChildApplicationApi`]: what an application page sees of the shell
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use canopy_config::Config;
//! use canopy_core::AssetLightDescription;
//! use canopy_favorites::EntityResolver;
//! use canopy_platform::WindowLauncher;
//! use canopy_shell::{Environment, PackageResources};
//!
//! # async fn example(
//! #     cdn: Arc<dyn PackageResources>,
//! #     explorer: Arc<dyn EntityResolver>,
//! #     browser: Arc<dyn WindowLauncher>,
//! #     asset: AssetLightDescription,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let env = Environment::builder(Config::load(None)?)
//!     .package_resources(cdn)
//!     .entity_resolver(explorer)
//!     .window_launcher(browser)
//!     .build()?;
//!
//! let manifest = env.installer().install_manifest().await?;
//! println!("installed {:?}", manifest.id.ids());
//!
//! env.apply_default_favorites().await?;
//! env.try_open_with_default(&asset).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
pub mod prelude;

mod child;
mod environment;
mod error;
mod installer_service;
mod open_with;
mod preferences;
mod requests;

pub use child::ChildApplicationApi;
pub use environment::{Environment, EnvironmentBuilder};
pub use error::{ShellError, ShellResult};
pub use installer_service::InstallerService;
pub use preferences::{
    Corporation, DEFAULT_PREFERENCES, Desktop, Preferences, PreferencesExtractor,
    PreferencesService, Profile, TopBanner, Widgets,
};
pub use requests::{PackageResources, RequestsExecutor};
