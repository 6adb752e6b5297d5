//! Suggestion engine configuration.

use serde::Deserialize;

/// Suggestion engine tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestConfig {
    /// How many suggestions to show at most.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Simulated ranking latency for the table ranker, in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

fn default_top_k() -> usize {
    3
}

fn default_latency_ms() -> u64 {
    150
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            latency_ms: default_latency_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SuggestConfig::default();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.latency_ms, 150);
    }
}
