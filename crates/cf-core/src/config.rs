//! Engine configuration
//!
//! Everything tunable at construction time. Every field has a default, so an
//! empty JSON object (or no config at all) yields the stock behavior.

use serde::{Deserialize, Serialize};

use crate::scheduler::SchedulerConfig;

/// Class carried by the home feed wrapper; never hidden or enclosed.
pub const DEFAULT_PROTECTED_CLASS: &str = "home-page-content";

/// Above this many buffered subtree roots a debounced pass sweeps the whole
/// document instead.
pub const DEFAULT_MAX_PENDING_ROOTS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    /// Names whose mention vetoes a climb (the signed-in user's display name).
    pub profile_names: Vec<String>,
    pub protected_classes: Vec<String>,
    pub max_pending_roots: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            profile_names: Vec::new(),
            protected_classes: vec![DEFAULT_PROTECTED_CLASS.to_string()],
            max_pending_roots: DEFAULT_MAX_PENDING_ROOTS,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON; missing fields keep their defaults.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EngineConfig::from_json(&json!({
            "profile_names": ["Ada Lovelace"],
            "scheduler": { "debounce_ms": 150 }
        }))
        .unwrap();
        assert_eq!(config.profile_names, vec!["Ada Lovelace".to_string()]);
        assert_eq!(config.scheduler.debounce_ms, 150);
        assert_eq!(config.scheduler.fallback_interval_ms, 3000);
        assert_eq!(config.protected_classes, vec![DEFAULT_PROTECTED_CLASS.to_string()]);
        assert_eq!(config.max_pending_roots, DEFAULT_MAX_PENDING_ROOTS);

        assert_eq!(EngineConfig::from_json(&json!({})).unwrap(), EngineConfig::default());
        assert!(EngineConfig::from_json(&json!({ "max_pending_roots": "many" })).is_err());
    }
}
