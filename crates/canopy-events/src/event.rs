//! Event types for the Canopy event bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use canopy_core::InstanceId;

/// Metadata attached to every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Correlation ID for tracing related events.
    pub correlation_id: Option<Uuid>,
    /// Source component that generated the event.
    pub source: String,
}

impl EventMetadata {
    /// Create new event metadata.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            correlation_id: None,
            source: source.into(),
        }
    }

    /// Set correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// An application-defined message broadcast to the shell and every running
/// instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dotted topic, e.g. `explorer.item-renamed`.
    pub topic: String,
    /// Free-form payload.
    #[serde(default)]
    pub payload: Value,
}

impl PlatformEvent {
    /// Create a platform event.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// A failed call to a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportFailure {
    /// The operation that failed, e.g. `save_favorites`.
    pub operation: String,
    /// HTTP-like status, when the collaborator reported one.
    pub status: Option<u16>,
    /// Human-readable description.
    pub message: String,
}

impl TransportFailure {
    /// Create a failure record.
    #[must_use]
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Attach a status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// All events that can occur in a Canopy session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellEvent {
    // ========== Broadcast ==========
    /// Message broadcast by the shell or an application instance.
    Broadcast {
        /// Event metadata.
        metadata: EventMetadata,
        /// The broadcast message.
        event: PlatformEvent,
    },

    // ========== Application lifecycle ==========
    /// A running instance was created and listed.
    InstanceCreated {
        /// Event metadata.
        metadata: EventMetadata,
        /// Instance ID.
        instance_id: InstanceId,
        /// Package the instance runs.
        cdn_package: String,
    },

    /// An instance became the focused one.
    InstanceFocused {
        /// Event metadata.
        metadata: EventMetadata,
        /// Instance ID.
        instance_id: InstanceId,
    },

    /// An instance was minimized (kept resident, not visible).
    InstanceMinimized {
        /// Event metadata.
        metadata: EventMetadata,
        /// Instance ID.
        instance_id: InstanceId,
    },

    /// An instance was closed.
    InstanceClosed {
        /// Event metadata.
        metadata: EventMetadata,
        /// Instance ID.
        instance_id: InstanceId,
    },

    // ========== Installer ==========
    /// A manifest was resolved and published to the session.
    ManifestResolved {
        /// Event metadata.
        metadata: EventMetadata,
        /// IDs of the contributing manifests.
        manifest_ids: Vec<String>,
    },

    // ========== Favorites ==========
    /// A favorites collection changed.
    FavoritesChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// Target key of the collection, e.g. `favoriteFolders`.
        collection: String,
        /// Number of entries after the change.
        count: usize,
    },

    // ========== Errors ==========
    /// A remote call failed.
    TransportError {
        /// Event metadata.
        metadata: EventMetadata,
        /// Failure details.
        failure: TransportFailure,
    },
}

impl ShellEvent {
    /// Event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Broadcast { .. } => "broadcast",
            Self::InstanceCreated { .. } => "instance_created",
            Self::InstanceFocused { .. } => "instance_focused",
            Self::InstanceMinimized { .. } => "instance_minimized",
            Self::InstanceClosed { .. } => "instance_closed",
            Self::ManifestResolved { .. } => "manifest_resolved",
            Self::FavoritesChanged { .. } => "favorites_changed",
            Self::TransportError { .. } => "transport_error",
        }
    }

    /// Event metadata.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            Self::Broadcast { metadata, .. }
            | Self::InstanceCreated { metadata, .. }
            | Self::InstanceFocused { metadata, .. }
            | Self::InstanceMinimized { metadata, .. }
            | Self::InstanceClosed { metadata, .. }
            | Self::ManifestResolved { metadata, .. }
            | Self::FavoritesChanged { metadata, .. }
            | Self::TransportError { metadata, .. } => metadata,
        }
    }

    /// The broadcast message, if this is a broadcast.
    #[must_use]
    pub fn as_broadcast(&self) -> Option<&PlatformEvent> {
        match self {
            Self::Broadcast { event, .. } => Some(event),
            _ => None,
        }
    }

    /// The failure, if this is a transport error.
    #[must_use]
    pub fn as_transport_error(&self) -> Option<&TransportFailure> {
        match self {
            Self::TransportError { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = ShellEvent::InstanceClosed {
            metadata: EventMetadata::new("test"),
            instance_id: InstanceId::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "instance_closed");
    }

    #[test]
    fn test_accessors() {
        let event = ShellEvent::TransportError {
            metadata: EventMetadata::new("requests"),
            failure: TransportFailure::new("get_favorites", "timeout").with_status(504),
        };
        assert_eq!(event.metadata().source, "requests");
        assert!(event.as_broadcast().is_none());
        assert_eq!(event.as_transport_error().unwrap().status, Some(504));
    }
}
