//! Request context for correlating one shell operation across crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation data for a single shell operation.
///
/// A context is created at the entry point of an operation (resolving the
/// manifest, toggling a favorite, creating an instance) and its span is
/// entered around the work so every log line carries the same ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique id of this operation.
    pub request_id: Uuid,
    /// Shared by an operation and every child operation it spawns.
    pub correlation_id: Uuid,
    /// Id of the parent operation, if any.
    pub parent_id: Option<Uuid>,
    /// Component that started the operation, e.g. `favorites`.
    pub component: String,
    /// Operation name, e.g. `toggle`.
    pub operation: Option<String>,
    /// Application instance the operation concerns, if any.
    pub instance: Option<String>,
    /// Start time.
    pub started_at: DateTime<Utc>,
}

impl RequestContext {
    /// Create a root context.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            request_id: id,
            correlation_id: id,
            parent_id: None,
            component: component.into(),
            operation: None,
            instance: None,
            started_at: Utc::now(),
        }
    }

    /// Create a child context sharing this context's correlation id.
    #[must_use]
    pub fn child(&self, component: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            correlation_id: self.correlation_id,
            parent_id: Some(self.request_id),
            component: component.into(),
            operation: None,
            instance: self.instance.clone(),
            started_at: Utc::now(),
        }
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Attach an application instance id.
    #[must_use]
    pub fn with_instance(mut self, instance: impl ToString) -> Self {
        self.instance = Some(instance.to_string());
        self
    }

    /// Milliseconds since the context was created.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// A span carrying this context's ids.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "operation",
            request_id = %self.request_id,
            correlation_id = %self.correlation_id,
            component = %self.component,
            operation = self.operation.as_deref(),
            instance = self.instance.as_deref(),
        )
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("shell")
    }
}

/// Enters a context's span and logs its duration on drop.
///
/// Only for synchronous sections; async code should use
/// `tracing::Instrument` with [`RequestContext::span`].
pub struct RequestGuard {
    context: RequestContext,
    _span: tracing::span::EnteredSpan,
}

impl RequestGuard {
    /// Enter the context's span.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("operation started");
        Self {
            context,
            _span: span,
        }
    }

    /// The guarded context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.context.elapsed_ms(), "operation completed");
    }
}
