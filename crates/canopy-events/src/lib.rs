//! Canopy Events - Event bus for the Canopy desktop shell.
//!
//! This crate provides:
//! - Event types for the application registry, the favorites facade and
//!   the installer
//! - The platform broadcast channel shared by the shell and every
//!   application instance
//! - The transport-error channel every remote call reports failures to
//!
//! # Example
//!
//! ```rust
//! use canopy_events::{EventBus, EventMetadata, PlatformEvent, ShellEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe_topic("explorer.*");
//!
//! bus.publish(ShellEvent::Broadcast {
//!     metadata: EventMetadata::new("shell"),
//!     event: PlatformEvent::new("explorer.item-renamed", serde_json::json!({"id": "i1"})),
//! });
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "broadcast");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::{EventMetadata, PlatformEvent, ShellEvent, TransportFailure};
