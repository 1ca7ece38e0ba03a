//! Mock collaborators for engine tests
//!
//! Configurable stand-ins for the classifier, crisis screen, scenario source
//! and response store, used to drive the engine through its failure paths.

#![allow(dead_code)]

use carepath_classifiers::{
    Classifier, CrisisAssessment, CrisisScreen, Prediction, ScenarioMatch, ScenarioSource,
};
use carepath_core::{Error, ResponseEnvelope, Result};
use carepath_engine::ResponseStore;
use std::sync::atomic::{AtomicU32, Ordering};

/// Classifier returning a fixed label and score
pub struct MockClassifier {
    label: String,
    score: f32,
    call_count: AtomicU32,
}

impl MockClassifier {
    pub fn new(label: &str, score: f32) -> Self {
        Self {
            label: label.to_string(),
            score,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Classifier for MockClassifier {
    fn predict(&self, _text: &str) -> Result<Prediction> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(Prediction::new(self.label.clone(), self.score))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Classifier that always errors
pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict(&self, _text: &str) -> Result<Prediction> {
        Err(Error::classifier("model unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Classifier that panics
pub struct PanickingClassifier;

impl Classifier for PanickingClassifier {
    fn predict(&self, _text: &str) -> Result<Prediction> {
        panic!("model exploded")
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Crisis screen that always errors
pub struct FailingCrisisScreen;

impl CrisisScreen for FailingCrisisScreen {
    fn assess(&self, _normalized: &str) -> Result<CrisisAssessment> {
        Err(Error::detector("phrase list unavailable"))
    }
}

/// Crisis screen that panics
pub struct PanickingCrisisScreen;

impl CrisisScreen for PanickingCrisisScreen {
    fn assess(&self, _normalized: &str) -> Result<CrisisAssessment> {
        panic!("detector exploded")
    }
}

/// Scenario source that always errors
pub struct FailingScenarioSource;

impl ScenarioSource for FailingScenarioSource {
    fn match_query(&self, _normalized: &str) -> Result<Option<ScenarioMatch>> {
        Err(Error::scenario("catalog unavailable"))
    }
}

/// Scenario source that panics
pub struct PanickingScenarioSource;

impl ScenarioSource for PanickingScenarioSource {
    fn match_query(&self, _normalized: &str) -> Result<Option<ScenarioMatch>> {
        panic!("matcher exploded")
    }
}

/// Response store whose reads and writes always fail
#[derive(Default)]
pub struct FailingStore {
    gets: AtomicU32,
    puts: AtomicU32,
}

impl FailingStore {
    pub fn gets(&self) -> u32 {
        self.gets.load(Ordering::Relaxed)
    }

    pub fn puts(&self) -> u32 {
        self.puts.load(Ordering::Relaxed)
    }
}

impl ResponseStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<ResponseEnvelope>> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        Err(Error::cache("store offline"))
    }

    fn put(&self, _key: &str, _envelope: &ResponseEnvelope) -> Result<()> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        Err(Error::cache("store offline"))
    }
}
