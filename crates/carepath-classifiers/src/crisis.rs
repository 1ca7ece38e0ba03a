//! Crisis phrase detector
//!
//! Scans a query for suicidal ideation, self-harm intent and direct crisis
//! language. Negation is not understood: "I would never hurt myself" still
//! triggers, which errs on the side of showing crisis resources.

use crate::classifier::CrisisScreen;
use aho_corasick::{AhoCorasick, MatchKind};
use carepath_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

const BUILTIN_PHRASES: &str = include_str!("../data/crisis.yaml");

/// Kind of crisis language a phrase signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisKind {
    SuicidalIdeation,
    SelfHarm,
    DirectCrisis,
}

impl CrisisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuicidalIdeation => "suicidal_ideation",
            Self::SelfHarm => "self_harm",
            Self::DirectCrisis => "direct_crisis",
        }
    }
}

/// Phrase list as stored in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisPhrases {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub suicidal_ideation: Vec<String>,

    #[serde(default)]
    pub self_harm: Vec<String>,

    #[serde(default)]
    pub direct_crisis: Vec<String>,
}

impl CrisisPhrases {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Flatten into (kind, phrase) pairs, lower-cased, blanks dropped
    fn labelled(&self) -> Vec<(CrisisKind, String)> {
        let groups = [
            (CrisisKind::SuicidalIdeation, &self.suicidal_ideation),
            (CrisisKind::SelfHarm, &self.self_harm),
            (CrisisKind::DirectCrisis, &self.direct_crisis),
        ];

        groups
            .into_iter()
            .flat_map(|(kind, phrases)| {
                phrases
                    .iter()
                    .map(|p| carepath_core::normalize(p))
                    .filter(|p| !p.is_empty())
                    .map(move |p| (kind, p))
            })
            .collect()
    }
}

/// Outcome of a crisis scan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrisisAssessment {
    /// Whether any crisis phrase was found
    pub triggered: bool,

    /// The first phrase found, if any
    pub matched_phrase: Option<String>,

    /// Kind of the matched phrase
    pub kind: Option<CrisisKind>,
}

impl CrisisAssessment {
    /// Assessment for text with no crisis language
    pub fn clear() -> Self {
        Self::default()
    }
}

/// Crisis detector built on a single Aho-Corasick automaton
pub struct CrisisDetector {
    matcher: AhoCorasick,
    phrases: Vec<(CrisisKind, String)>,
    version: String,
}

impl CrisisDetector {
    /// Create a detector from a phrase list
    pub fn new(phrases: CrisisPhrases) -> Result<Self> {
        let labelled = phrases.labelled();
        if labelled.is_empty() {
            return Err(Error::config("crisis phrase list is empty"));
        }

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(labelled.iter().map(|(_, p)| p.as_str()))
            .map_err(|e| Error::config(format!("Failed to build crisis matcher: {}", e)))?;

        Ok(Self {
            matcher,
            phrases: labelled,
            version: phrases.version,
        })
    }

    /// Detector with the built-in phrase list
    pub fn builtin() -> Result<Self> {
        Self::new(CrisisPhrases::from_yaml(BUILTIN_PHRASES)?)
    }

    /// Detector with phrases loaded from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(CrisisPhrases::from_file(path)?)
    }

    /// Number of phrases scanned for
    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    /// Phrase list version
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl CrisisScreen for CrisisDetector {
    fn assess(&self, normalized: &str) -> Result<CrisisAssessment> {
        let found = self
            .matcher
            .try_find(normalized)
            .map_err(|e| Error::detector(format!("crisis scan failed: {}", e)))?;

        let Some(m) = found else {
            return Ok(CrisisAssessment::clear());
        };

        let (kind, phrase) = &self.phrases[m.pattern().as_usize()];
        warn!(kind = kind.as_str(), phrase = %phrase, "Crisis language detected");

        Ok(CrisisAssessment {
            triggered: true,
            matched_phrase: Some(phrase.clone()),
            kind: Some(*kind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> CrisisDetector {
        CrisisDetector::builtin().unwrap()
    }

    #[test]
    fn test_builtin_phrases_load() {
        let detector = detector();
        assert!(detector.phrase_count() > 20);
        assert_eq!(detector.version(), "2024.06");
    }

    #[test]
    fn test_detects_suicidal_ideation() {
        let result = detector().assess("i want to kill myself").unwrap();
        assert!(result.triggered);
        assert_eq!(result.matched_phrase.as_deref(), Some("kill myself"));
        assert_eq!(result.kind, Some(CrisisKind::SuicidalIdeation));
    }

    #[test]
    fn test_case_insensitive() {
        let result = detector().assess("I Want To End My Life").unwrap();
        assert!(result.triggered);
        assert_eq!(result.matched_phrase.as_deref(), Some("end my life"));
    }

    #[test]
    fn test_self_harm() {
        let result = detector().assess("sometimes i cut myself when it gets bad").unwrap();
        assert!(result.triggered);
        assert_eq!(result.kind, Some(CrisisKind::SelfHarm));
    }

    #[test]
    fn test_clean_text() {
        let result = detector()
            .assess("my elderly father has trouble getting out of bed")
            .unwrap();
        assert_eq!(result, CrisisAssessment::clear());
    }

    #[test]
    fn test_negated_phrase_still_triggers() {
        let result = detector().assess("i would never kill myself").unwrap();
        assert!(result.triggered);
    }

    #[test]
    fn test_empty_phrase_list_rejected() {
        let phrases = CrisisPhrases {
            version: "empty".to_string(),
            suicidal_ideation: vec!["   ".to_string()],
            self_harm: vec![],
            direct_crisis: vec![],
        };
        assert!(CrisisDetector::new(phrases).is_err());
    }

    #[test]
    fn test_custom_phrases_from_yaml() {
        let yaml = r#"
version: test
direct_crisis:
  - "  RED   Alert "
"#;
        let detector = CrisisDetector::new(CrisisPhrases::from_yaml(yaml).unwrap()).unwrap();
        let result = detector.assess("this is a red alert").unwrap();
        assert_eq!(result.matched_phrase.as_deref(), Some("red alert"));
        assert_eq!(result.kind, Some(CrisisKind::DirectCrisis));
    }
}
