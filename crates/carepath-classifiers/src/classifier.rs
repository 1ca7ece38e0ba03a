//! Decision source traits and common types

use carepath_core::{Category, Result};

use crate::crisis::CrisisAssessment;
use crate::scenario::ScenarioMatch;

/// Trait for statistical text models.
///
/// Implementations are opaque collaborators: the engine only relies on a
/// label and a score per input.
pub trait Classifier: Send + Sync {
    /// Predict a label for the given text
    fn predict(&self, text: &str) -> Result<Prediction>;

    /// Get the model name
    fn name(&self) -> &str;
}

/// Safety screen run ahead of every other decision source
pub trait CrisisScreen: Send + Sync {
    /// Assess normalized query text for crisis language
    fn assess(&self, normalized: &str) -> Result<CrisisAssessment>;
}

/// Rule-based scenario lookup
pub trait ScenarioSource: Send + Sync {
    /// Find the highest-priority scenario matching normalized query text
    fn match_query(&self, normalized: &str) -> Result<Option<ScenarioMatch>>;
}

/// Raw model output, before taxonomy and range checks
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Predicted label
    pub label: String,

    /// Score for the predicted label (expected 0.0-1.0)
    pub score: f32,

    /// All class scores, if the model exposes them
    pub all_scores: Option<Vec<(String, f32)>>,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
            all_scores: None,
            latency_us: 0,
        }
    }
}

/// Validated classification produced by the adapter
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Category from the fixed taxonomy
    pub category: Category,

    /// Confidence score (0.0-1.0)
    pub confidence: f32,

    /// Model that produced the result
    pub model: String,

    /// Latency in microseconds
    pub latency_us: u64,

    /// Set when the model failed or returned something unusable
    pub fault: Option<String>,
}

impl ClassificationResult {
    /// Create a new classification result
    pub fn new(category: Category, confidence: f32) -> Self {
        Self {
            category,
            confidence,
            model: String::new(),
            latency_us: 0,
            fault: None,
        }
    }

    /// The designated result for input the model cannot be asked about
    pub fn unknown() -> Self {
        Self::new(Category::Unknown, 0.0)
    }

    /// Check if confidence reaches threshold
    pub fn exceeds_threshold(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}
