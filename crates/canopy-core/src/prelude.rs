//! Prelude module - commonly used types for convenient import.
//!
//! Use `use canopy_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Identifiers
pub use crate::InstanceId;

// Shared state
pub use crate::{ReplayCache, ReplayLatest, ReplayReceiver, SafeMode};

// Domain types
pub use crate::{
    AppExecutionInfo, ApplicationGraphics, ApplicationInfo, AssetLightDescription,
    OpenWithParametrization, Widget,
};
