//! Canopy Platform - the application registry of the Canopy desktop shell.
//!
//! This crate provides:
//! - [`PlatformState`], the registry of running application instances with
//!   its single focus slot
//! - [`RunningApp`], one embedded instance and its widget channels
//! - [`PlatformHandle`], the typed handle applications use to start other
//!   applications and broadcast events, with [`DetachedPlatform`] as the
//!   fallback outside the shell
//! - The application URL scheme
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use canopy_events::EventBus;
//! use canopy_platform::{CreateInstance, PlatformResult, PlatformState, Target, WindowLauncher};
//!
//! struct Browser;
//!
//! impl WindowLauncher for Browser {
//!     fn open(&self, _url: &str, _target: Target) -> PlatformResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! let state = PlatformState::new(EventBus::new(), Arc::new(Browser));
//! let app = state.register(CreateInstance::new("@youwol/stories").with_focus(true));
//!
//! assert_eq!(state.focused_id(), Some(app.instance_id()));
//! assert!(state.close(app.instance_id()));
//! assert!(state.running_applications().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod handle;
mod host;
mod running_app;
mod scheme;
mod state;

pub use error::{PlatformError, PlatformResult};
pub use handle::{DetachedPlatform, Launch, PlatformHandle};
pub use host::{FrameHandle, FrameHost, MetadataSource, NoFrameHost, Target, WindowLauncher};
pub use running_app::{CreateInstance, RunningApp, TopBannerViews};
pub use scheme::{
    DEFAULT_URL_PREFIX, DEFAULT_VERSION, INSTANCE_ID_PARAM, UrlScheme, app_url,
    instance_id_from_location,
};
pub use state::PlatformState;
