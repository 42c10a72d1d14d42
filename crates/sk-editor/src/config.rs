//! Session configuration.

use serde::{Deserialize, Serialize};
use sk_core::ExportOptions;
use std::time::Duration;

/// Tunables for an editor session. Missing JSON fields take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// History entries kept, baseline included. Oldest are evicted first.
    pub history_limit: usize,
    /// Largest project file `save_project` will produce.
    pub max_project_bytes: usize,
    /// Quiet period before a queued property edit is committed.
    pub debounce_ms: u64,
    pub export: ExportOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            max_project_bytes: 5 * 1024 * 1024,
            debounce_ms: 300,
            export: ExportOptions::default(),
        }
    }
}

impl SessionConfig {
    /// Parse a host-supplied JSON config.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
