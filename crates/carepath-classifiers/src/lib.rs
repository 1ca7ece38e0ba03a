//! CarePath Classifiers
//!
//! The three decision sources the engine arbitrates between, in priority order:
//! - Crisis detection: phrase scanner for self-harm and suicide risk language
//! - Scenario matching: ordered catalog of known caregiving scenarios with canned guidance
//! - Statistical classification: adapter around an externally trained text model
//!
//! Everything here is loaded once at startup and read-only afterwards.

pub mod adapter;
pub mod classifier;
pub mod crisis;
pub mod lexicon;
pub mod naive_bayes;
pub mod scenario;

pub use adapter::{ClassifierAdapter, ConfidencePolicy, CLASSIFIER_CONFIDENCE_CEILING};
pub use classifier::{ClassificationResult, Classifier, CrisisScreen, Prediction, ScenarioSource};
pub use crisis::{CrisisAssessment, CrisisDetector, CrisisKind, CrisisPhrases};
pub use lexicon::LexiconModel;
pub use naive_bayes::{NaiveBayesArtifact, NaiveBayesModel};
pub use scenario::{
    ScenarioCatalog, ScenarioMatch, ScenarioMatcher, ScenarioRecord, TemplateSelection,
    SCENARIO_CONFIDENCE,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::adapter::{ClassifierAdapter, ConfidencePolicy};
    pub use crate::classifier::{ClassificationResult, Classifier, CrisisScreen, ScenarioSource};
    pub use crate::crisis::{CrisisAssessment, CrisisDetector};
    pub use crate::lexicon::LexiconModel;
    pub use crate::naive_bayes::NaiveBayesModel;
    pub use crate::scenario::{ScenarioCatalog, ScenarioMatch, ScenarioMatcher};
}
