//! Canopy Core - shared types for the Canopy desktop shell runtime.
//!
//! This crate provides:
//! - Identifiers for running application instances
//! - Application metadata and asset descriptions shared by every subsystem
//! - Replay-latest channels and coalescing caches used as the session's
//!   shared state
//! - The safe-mode switch consulted by the installer and preferences layers
//!
//! # Replay channels
//!
//! Every piece of shared session state (resolved manifest, application
//! metadata, preferences, favorites collections, running applications) is
//! held in a [`ReplayLatest`]: new subscribers immediately observe the most
//! recent value, and every subscriber observes later publications.
//! [`ReplayCache`] adds coalesced lazy initialisation on top: the first
//! caller runs the initializer, concurrent and later callers share its
//! result.
//!
//! ```rust
//! use canopy_core::ReplayCache;
//!
//! # async fn example() {
//! let cache: ReplayCache<u32> = ReplayCache::new();
//! let value = cache
//!     .get_or_try_init(|| async { Ok::<_, std::convert::Infallible>(7) })
//!     .await
//!     .unwrap();
//! assert_eq!(value, 7);
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
mod ids;
mod replay;
mod safe_mode;
mod types;

pub use error::{CoreError, CoreResult};
pub use ids::InstanceId;
pub use replay::{ReplayCache, ReplayLatest, ReplayReceiver};
pub use safe_mode::SafeMode;
pub use types::{
    AppExecutionInfo, ApplicationGraphics, ApplicationInfo, AssetLightDescription,
    OpenWithParametrization, Widget,
};
