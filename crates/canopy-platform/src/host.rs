//! Seams to the hosting environment.
//!
//! The registry never touches a browser directly: it opens top-level
//! contexts through a [`WindowLauncher`], releases embedded frames through
//! a [`FrameHost`] and looks up application metadata through a
//! [`MetadataSource`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use canopy_core::{ApplicationInfo, InstanceId};

use crate::error::PlatformResult;

/// Where a launcher opens a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Replace the current top-level context.
    SameWindow,
    /// Open a new top-level context.
    NewTab,
}

/// Opens URLs in top-level browsing contexts.
pub trait WindowLauncher: Send + Sync {
    /// Open `url` in `target`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Launch`](crate::PlatformError::Launch) if
    /// the host refuses to open it.
    fn open(&self, url: &str, target: Target) -> PlatformResult<()>;
}

/// An embedded frame showing one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameHandle {
    /// Instance shown in the frame.
    pub instance_id: InstanceId,
    /// Frame source URL.
    pub src: String,
}

/// Owns the embedded frames of running instances.
pub trait FrameHost: Send + Sync {
    /// Remove the frame from the page.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Frame`](crate::PlatformError::Frame) if
    /// the frame could not be removed.
    fn release(&self, frame: &FrameHandle) -> PlatformResult<()>;
}

/// Frame host for sessions without a renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFrameHost;

impl FrameHost for NoFrameHost {
    fn release(&self, frame: &FrameHandle) -> PlatformResult<()> {
        trace!(instance_id = %frame.instance_id, "no frame host, nothing to release");
        Ok(())
    }
}

/// Best-effort application metadata lookup.
///
/// Implementations report failures on their own channel and answer
/// `None`; a missing metadata document is not an error.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Metadata of `cdn_package` at `version`.
    async fn application_info(&self, cdn_package: &str, version: &str) -> Option<ApplicationInfo>;
}
