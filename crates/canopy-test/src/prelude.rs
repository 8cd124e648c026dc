//! Prelude module - commonly used types for convenient import.
//!
//! Use `use canopy_test::prelude::*;` to import all essential types.

// Mocks
pub use crate::{
    FlakyBlobStore, MockEntityResolver, MockMetadataSource, RecordingFrameHost, RecordingLauncher,
};

// Harness
pub use crate::{TestShell, TestShellBuilder, init_test_logging};

// Fixtures
pub use crate::{test_app_info, test_asset, test_folder, test_group_id, test_item};
