//! CLI configuration

use carepath_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Decision engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &crate::Cli) -> anyhow::Result<Self> {
        // Missing file means defaults
        let mut config: Self = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        if let Some(threshold) = cli.threshold {
            config.engine.confidence_threshold = threshold;
        }

        if cli.no_cache {
            config.engine.cache.enabled = false;
        }

        if cli.pretty {
            config.output.pretty = true;
        }

        config.engine.validate()?;
        Ok(config)
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print response envelopes
    #[serde(default)]
    pub pretty: bool,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,
}
