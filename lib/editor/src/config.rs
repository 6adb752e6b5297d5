//! Aggregated editor configuration.

use agentflow_monitor::MonitorConfig;
use agentflow_persistence::PersistenceConfig;
use agentflow_suggest::SuggestConfig;
use serde::Deserialize;

/// Configuration for a full editor session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorConfig {
    /// Persistence and auto-save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Execution overlay settings.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Suggestion engine settings.
    #[serde(default)]
    pub suggest: SuggestConfig,
}

impl EditorConfig {
    /// Loads configuration from `AGENTFLOW`-prefixed environment
    /// variables, e.g. `AGENTFLOW__PERSISTENCE__AUTOSAVE__DEBOUNCE_MS`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("AGENTFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
