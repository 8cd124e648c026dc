//! Canopy Installer - the manifest resolution engine.
//!
//! Plugins contribute capabilities (context-menu actions, asset previews,
//! open-with handlers, declared applications, default favorites) through
//! [`Manifest`]s. An [`Installer`] collects three kinds of sources:
//!
//! - library paths (`"<package>.<export.path>"`) resolved through a
//!   [`ModuleLoader`] to the generator the library exports
//! - generators ([`ManifestGenerator`]) that extend a fresh installer
//! - already resolved manifests
//!
//! [`Installer::resolve`] walks the generator graph, running each generator
//! at most once and failing past a depth limit, and merges everything into
//! one canonical manifest.
//!
//! # Example
//!
//! ```rust
//! use canopy_installer::{Contributions, Installer, LibraryRegistry, Manifest, generator_fn};
//!
//! # async fn example() -> canopy_installer::InstallerResult<()> {
//! let apps = generator_fn("apps", |installer| async move {
//!     Ok(installer.with(
//!         Contributions::new().manifest(Manifest::new("apps").with_applications(["@youwol/stories"])),
//!     ))
//! });
//!
//! let manifest = Installer::new()
//!     .with(Contributions::new().generator(apps))
//!     .resolve(&LibraryRegistry::new())
//!     .await?;
//! assert_eq!(manifest.applications, vec!["@youwol/stories"]);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod generator;
mod installer;
mod loader;
mod manifest;
mod open_with;
mod script;

pub use error::{InstallerError, InstallerResult, LoaderError};
pub use generator::{GeneratorRef, ManifestGenerator, generator_fn};
pub use installer::{Contributions, DEFAULT_MAX_DEPTH, Installer};
pub use loader::{ExportNode, LibraryModule, LibraryPath, LibraryRegistry, ModuleLoader};
pub use manifest::{ApplicationData, Contributor, DefaultFavorites, Manifest, ManifestId};
pub use open_with::{
    OpeningApp, default_opening_app, evaluate_match, evaluate_parameters, flat_parametrizations,
    opening_apps,
};
pub use script::{InstallerDocument, ManifestDocument, ScriptSource, installer_from_script};
