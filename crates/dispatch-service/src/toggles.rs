//! Runtime feature toggles.
//!
//! Toggles are plain atomics shared through the settings object, so a test
//! can flip one for its own settings instance without affecting others. The
//! scoped override restores the previous value on drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A boolean feature toggle with scoped-override support.
#[derive(Debug, Clone)]
pub struct Toggle {
    enabled: Arc<AtomicBool>,
}

impl Toggle {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Override the toggle until the returned guard is dropped.
    #[must_use = "the override ends when the guard is dropped"]
    pub fn scoped_override(&self, enabled: bool) -> ToggleOverride {
        let previous = self.enabled.swap(enabled, Ordering::SeqCst);
        ToggleOverride {
            enabled: Arc::clone(&self.enabled),
            previous,
        }
    }
}

impl Default for Toggle {
    fn default() -> Self {
        Self::new(false)
    }
}

/// RAII guard restoring a toggle to its pre-override value.
pub struct ToggleOverride {
    enabled: Arc<AtomicBool>,
    previous: bool,
}

impl Drop for ToggleOverride {
    fn drop(&mut self) {
        self.enabled.store(self.previous, Ordering::SeqCst);
    }
}
