//! Safe-mode switch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared recovery switch.
///
/// When enabled, the installer and preferences layers ignore any persisted
/// user script and fall back to the compiled-in defaults. Clones share the
/// same flag.
#[derive(Debug, Clone, Default)]
pub struct SafeMode(Arc<AtomicBool>);

impl SafeMode {
    /// Create a switch in the given state.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    /// Turn safe mode on.
    pub fn enable(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether safe mode is on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
