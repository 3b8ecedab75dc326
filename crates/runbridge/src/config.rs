use serde::{Deserialize, Serialize};

/// Runbridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunbridgeConfig {
    /// Base directory for snapshot blob storage
    pub base_dir: String,

    /// Log level consumers should hand to their tracing subscriber
    pub log_level: String,
}

impl Default for RunbridgeConfig {
    fn default() -> Self {
        Self {
            base_dir: ".".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl RunbridgeConfig {
    /// Load from configuration file
    pub fn load_from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))
    }
}
