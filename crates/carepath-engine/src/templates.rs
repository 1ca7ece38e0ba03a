//! Response library: generic replies per classifier category

use carepath_core::{Category, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const BUILTIN_LIBRARY: &str = include_str!("../data/responses.yaml");

/// Core text for crisis responses; emergency resources are appended by the formatter
pub const CRISIS_CORE: &str = "It sounds like you may be going through something really painful right now, \
and I'm concerned about your safety. You don't have to face this alone. \
Please reach out to someone right now; trained counselors are available at any hour.";

/// Core text when the crisis screen itself could not run
pub const SAFETY_DEFAULT_CORE: &str = "I'm not able to fully review your message right now. \
If you or someone you care for might be in danger or thinking about self-harm, \
please contact emergency services or a crisis line immediately.";

/// Category response templates plus fallback and clarification text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseLibrary {
    #[serde(default)]
    pub version: String,

    /// Reply used when the classifier is not trusted
    pub fallback: String,

    /// Reply used for empty or non-text input
    pub clarification: String,

    /// One template per answerable category
    pub categories: BTreeMap<Category, String>,
}

impl ResponseLibrary {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let library: Self = serde_yaml::from_str(yaml)?;
        library.validate()?;
        Ok(library)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// The library shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_LIBRARY)
    }

    /// Every answerable category needs a template
    pub fn validate(&self) -> Result<()> {
        if self.fallback.trim().is_empty() {
            return Err(Error::config("response library has no fallback text"));
        }
        if self.clarification.trim().is_empty() {
            return Err(Error::config("response library has no clarification text"));
        }

        let missing: Vec<&str> = Category::ANSWERABLE
            .iter()
            .filter(|c| self.categories.get(*c).map_or(true, |t| t.trim().is_empty()))
            .map(|c| c.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(Error::config(format!(
                "response library missing categories: {}",
                missing.join(", ")
            )));
        }

        if let Some(reserved) = self.categories.keys().find(|c| !c.is_answerable()) {
            return Err(Error::config(format!(
                "response library defines reserved category '{}'",
                reserved
            )));
        }

        Ok(())
    }

    /// Template for a category
    pub fn response_for(&self, category: Category) -> Option<&str> {
        self.categories.get(&category).map(|t| t.trim_end())
    }

    pub fn fallback(&self) -> &str {
        self.fallback.trim_end()
    }

    pub fn clarification(&self) -> &str {
        self.clarification.trim_end()
    }
}
