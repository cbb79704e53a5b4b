// Player configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use twinplay_core::{BackendKind, PlayerError, Result};

/// Heartbeat period while playing (milliseconds)
const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 500;

const DEFAULT_USER_AGENT: &str = "twinplay";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Minimum time between two heartbeat events
    pub heartbeat_interval_ms: u64,
    /// User agent handed to the adaptive engine's data sources
    pub user_agent: String,
    /// Backend to use when both engine factories are available
    pub backend: BackendKind,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            backend: BackendKind::default(),
        }
    }
}

impl PlayerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PlayerError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PlayerError::Config(e.to_string()))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.heartbeat_interval(), Duration::from_millis(500));
        assert_eq!(config.user_agent, "twinplay");
        assert_eq!(config.backend, BackendKind::Adaptive);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PlayerConfig::from_json(r#"{ "backend": "native" }"#).unwrap();
        assert_eq!(config.backend, BackendKind::Native);
        assert_eq!(config.heartbeat_interval_ms, 500);
        assert_eq!(config.user_agent, "twinplay");
    }

    #[test]
    fn test_invalid_json() {
        let err = PlayerConfig::from_json(r#"{ "backend": "vlc" }"#).unwrap_err();
        assert!(matches!(err, PlayerError::Config(_)));
    }

    #[test]
    fn test_json_output_reads_back() {
        let config = PlayerConfig {
            heartbeat_interval_ms: 250,
            user_agent: "tv-app/3.1".into(),
            backend: BackendKind::Native,
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"heartbeat_interval_ms\": 250"));
        assert_eq!(PlayerConfig::from_json(&json).unwrap(), config);
    }
}
