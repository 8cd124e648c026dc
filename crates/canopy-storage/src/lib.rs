//! Canopy Storage - remote blob persistence.
//!
//! The shell persists per-user documents (favorites, installer script,
//! preferences script, default-favorites marker) as JSON blobs keyed by an
//! owner package name and a data name. The remote service is an external
//! collaborator; this crate defines the seam:
//!
//! - [`BlobStore`] - the async trait every backend implements
//! - [`MemoryBlobStore`] - in-process implementation for tests and offline
//!   sessions
//! - [`ScopedBlobStore`] - a store bound to one owner package with typed
//!   JSON helpers
//!
//! Writes always replace the whole blob. There is no version token: the
//! last write wins.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod blob;
pub mod error;

pub use blob::{BlobKey, BlobStore, MemoryBlobStore, ScopedBlobStore};
pub use error::{StorageError, StorageResult};
