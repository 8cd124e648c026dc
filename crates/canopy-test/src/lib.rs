//! Canopy Test - Shared test utilities for the Canopy shell.
//!
//! This crate provides mock collaborators, fixtures and a mock-backed
//! session that can be used across Canopy crates as a dev-dependency.
//!
//! # Usage
//!
//! ```rust,ignore
//! use canopy_favorites::FavoriteKind;
//! use canopy_test::{MockEntityResolver, TestShell};
//!
//! #[tokio::test]
//! async fn test_favorite_folder() {
//!     let shell = TestShell::builder()
//!         .explorer(MockEntityResolver::new().with_folder("f1", "Docs"))
//!         .build()
//!         .unwrap();
//!
//!     shell.env.favorites().toggle_favorite_folder("f1").await.unwrap();
//!     let folders = shell.env.favorites().get(FavoriteKind::Folders).await.unwrap();
//!     assert_eq!(folders[0].name(), "Docs");
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
