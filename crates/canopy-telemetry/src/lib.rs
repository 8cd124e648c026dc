//! Canopy Telemetry - Logging and request spans for the Canopy desktop shell.
//!
//! This crate provides:
//! - Configurable `tracing-subscriber` setup (pretty, compact, JSON, full)
//!   writing to stdout, stderr or a rolling file
//! - [`RequestContext`] for correlating the log lines of one shell
//!   operation (a manifest resolution, a favorites toggle, ...)
//!
//! # Example
//!
//! ```rust,no_run
//! use canopy_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), canopy_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("canopy_installer=debug");
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("installer").with_operation("resolve");
//! let _span = ctx.span().entered();
//! tracing::info!("resolving manifest");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
