//! Prelude module - commonly used types for convenient import.
//!
//! Use `use canopy_platform::prelude::*;` to import all essential types.

// Errors
pub use crate::{PlatformError, PlatformResult};

// Registry
pub use crate::{CreateInstance, PlatformState, RunningApp, TopBannerViews};

// Handles
pub use crate::{DetachedPlatform, Launch, PlatformHandle};

// Host seams
pub use crate::{FrameHandle, FrameHost, MetadataSource, Target, WindowLauncher};
