//! Prelude module - commonly used types for convenient import.
//!
//! Use `use canopy_installer::prelude::*;` to import all essential types.

pub use crate::{InstallerError, InstallerResult, LoaderError};

pub use crate::{Contributions, Installer, Manifest, ManifestId};

pub use crate::{GeneratorRef, ManifestGenerator, generator_fn};

pub use crate::{LibraryModule, LibraryRegistry, ModuleLoader};

pub use crate::{InstallerDocument, ScriptSource};
