//! Persistence configuration, loaded from the environment.

use serde::Deserialize;

/// Configuration for the persistence layer.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Base URL of the remote flow API.
    #[serde(default = "default_remote_base_url")]
    pub remote_base_url: String,

    /// SQLite connection URL for the local store.
    #[serde(default = "default_local_database_url")]
    pub local_database_url: String,

    /// Auto-save pipeline tuning.
    #[serde(default)]
    pub autosave: AutoSaveConfig,
}

/// Auto-save pipeline timing.
#[derive(Debug, Clone, Deserialize)]
pub struct AutoSaveConfig {
    /// Trailing debounce applied to graph changes, in milliseconds.
    /// Every change restarts the timer; the save fires after the canvas
    /// has been quiet for this long.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How long the saved notice stays up before clearing, in
    /// milliseconds.
    #[serde(default = "default_saved_notice_ms")]
    pub saved_notice_ms: u64,

    /// How long the error notice stays up before clearing, in
    /// milliseconds. Errors clear without retrying; the next save
    /// attempt comes from the next graph change.
    #[serde(default = "default_error_notice_ms")]
    pub error_notice_ms: u64,
}

fn default_remote_base_url() -> String {
    "http://localhost:3000/api".to_owned()
}

fn default_local_database_url() -> String {
    "sqlite://agentflow.db?mode=rwc".to_owned()
}

fn default_debounce_ms() -> u64 {
    5_000
}

fn default_saved_notice_ms() -> u64 {
    3_000
}

fn default_error_notice_ms() -> u64 {
    5_000
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            remote_base_url: default_remote_base_url(),
            local_database_url: default_local_database_url(),
            autosave: AutoSaveConfig::default(),
        }
    }
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            saved_notice_ms: default_saved_notice_ms(),
            error_notice_ms: default_error_notice_ms(),
        }
    }
}

impl PersistenceConfig {
    /// Loads configuration from `AGENTFLOW`-prefixed environment
    /// variables, e.g. `AGENTFLOW__AUTOSAVE__DEBOUNCE_MS`.
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
