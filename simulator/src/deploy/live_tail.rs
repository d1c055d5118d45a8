//! Live-tail gate

use serde::Serialize;

/// Gates progression and log emission, and tells consumers whether to
/// follow the newest log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiveTailController {
    enabled: bool,
    auto_scroll: bool,
}

impl LiveTailController {
    pub fn new(enabled: bool, auto_scroll: bool) -> Self {
        Self {
            enabled,
            auto_scroll,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flip the gate and return the new value
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Returns true if the value changed
    pub fn set(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }

    pub fn should_auto_scroll(&self) -> bool {
        self.enabled && self.auto_scroll
    }
}

impl Default for LiveTailController {
    fn default() -> Self {
        Self::new(true, true)
    }
}
