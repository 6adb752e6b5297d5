//! Monitor configuration.

use serde::Deserialize;

/// Overlay timing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// How long the overlay stays up after the run stops executing, in
    /// milliseconds.
    #[serde(default = "default_auto_dismiss_ms")]
    pub auto_dismiss_ms: u64,
}

fn default_auto_dismiss_ms() -> u64 {
    2_000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            auto_dismiss_ms: default_auto_dismiss_ms(),
        }
    }
}
