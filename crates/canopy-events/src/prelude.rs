//! Prelude module - commonly used types for convenient import.
//!
//! Use `use canopy_events::prelude::*;` to import all essential types.

// Event bus
pub use crate::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};

// Events
pub use crate::{EventMetadata, PlatformEvent, ShellEvent, TransportFailure};
