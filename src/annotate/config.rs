//! Configuration for the annotation engine and scan orchestrator

use serde::{Deserialize, Serialize};

/// Sanity ceiling against runaway annotation loops
pub const DEFAULT_MAX_ANNOTATIONS: usize = 9000;
/// Bound on every tree walk
pub const DEFAULT_MAX_DEPTH: usize = 256;
/// Reserved marker class owned by this engine
pub const DEFAULT_MARKER_CLASS: &str = "clearcost";

/// Engine configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClearCostConfig {
    /// Scanning is skipped once this many markers are present. Default: 9000
    #[serde(default = "default_max_annotations")]
    pub max_annotations: usize,
    /// Deepest level searched below (or above) a node. Default: 256
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Class name identifying inserted badges. Default: "clearcost"
    #[serde(default = "default_marker_class")]
    pub marker_class: String,
    /// Console log level (off, error, warn, info, debug, trace). Default: "info"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_annotations() -> usize { DEFAULT_MAX_ANNOTATIONS }
fn default_max_depth() -> usize { DEFAULT_MAX_DEPTH }
fn default_marker_class() -> String { DEFAULT_MARKER_CLASS.to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ClearCostConfig {
    fn default() -> Self {
        Self {
            max_annotations: DEFAULT_MAX_ANNOTATIONS,
            max_depth: DEFAULT_MAX_DEPTH,
            marker_class: default_marker_class(),
            log_level: default_log_level(),
        }
    }
}

impl ClearCostConfig {
    /// Parsed log level, falling back to `Info` for unrecognized names
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClearCostConfig::default();
        assert_eq!(config.max_annotations, 9000);
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.marker_class, "clearcost");
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{"max_annotations": 50, "log_level": "debug"}"#;
        let config: ClearCostConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_annotations, 50);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.marker_class, "clearcost");
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_config_bad_level_falls_back() {
        let json = r#"{"log_level": "loud"}"#;
        let config: ClearCostConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }
}
