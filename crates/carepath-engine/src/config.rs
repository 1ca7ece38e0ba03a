//! Engine configuration

use carepath_classifiers::{TemplateSelection, CLASSIFIER_CONFIDENCE_CEILING};
use carepath_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Decision engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum classifier confidence trusted over the generic fallback, at most
    /// `CLASSIFIER_CONFIDENCE_CEILING`
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,

    /// Run the crisis screen before the cache read as well
    #[serde(default)]
    pub crisis_check_before_cache: bool,

    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Template choice for scenarios with several templates
    #[serde(default)]
    pub template_selection: TemplateSelection,

    /// Data files overriding the built-in catalog, phrases, responses and model
    #[serde(default)]
    pub sources: DataSources,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_threshold(),
            crisis_check_before_cache: false,
            cache: CacheConfig::default(),
            template_selection: TemplateSelection::default(),
            sources: DataSources::default(),
        }
    }
}

impl EngineConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let threshold = self.confidence_threshold;
        if !threshold.is_finite() || !(0.0..=CLASSIFIER_CONFIDENCE_CEILING).contains(&threshold) {
            return Err(Error::config(format!(
                "confidence_threshold {} outside [0, {}]",
                threshold, CLASSIFIER_CONFIDENCE_CEILING
            )));
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(Error::config("cache.max_entries must be greater than zero"));
        }
        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(Error::config("cache.ttl_secs must be greater than zero"));
        }
        Ok(())
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the response cache
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached responses
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

/// Optional data files; built-in data is used for any that are unset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSources {
    /// Scenario catalog (YAML)
    pub catalog_path: Option<PathBuf>,

    /// Crisis phrase list (YAML)
    pub crisis_phrases_path: Option<PathBuf>,

    /// Category response library (YAML)
    pub responses_path: Option<PathBuf>,

    /// Trained naive Bayes artifact (JSON)
    pub model_path: Option<PathBuf>,
}

fn default_threshold() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    1000
}

fn default_ttl_secs() -> u64 {
    4 * 60 * 60
}
