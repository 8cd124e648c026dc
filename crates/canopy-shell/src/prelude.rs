//! Prelude module - commonly used types for convenient import.
//!
//! Use `use canopy_shell::prelude::*;` to import all essential types.

// Errors
pub use crate::{ShellError, ShellResult};

// Session
pub use crate::{ChildApplicationApi, Environment, EnvironmentBuilder, PackageResources};

// Services
pub use crate::{InstallerService, PreferencesExtractor, PreferencesService, RequestsExecutor};

// Preferences
pub use crate::{Preferences, Widgets};
