//! Classifier adapter
//!
//! Wraps an opaque model and guarantees the engine only ever sees a category
//! from the taxonomy with a confidence in range. Model errors, panics and
//! unusable output all degrade to `unknown` with confidence 0.0.

use crate::classifier::{ClassificationResult, Classifier, Prediction};
use carepath_core::{Category, Error, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Upper bound on reported model confidence, kept below scenario confidence
pub const CLASSIFIER_CONFIDENCE_CEILING: f32 = 0.94;

/// Adapter between the engine and a text model
#[derive(Clone)]
pub struct ClassifierAdapter {
    model: Arc<dyn Classifier>,
}

impl ClassifierAdapter {
    /// Create a new adapter
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        Self { model }
    }

    /// Name of the wrapped model
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Classify text. Never fails.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        if !carepath_core::is_answerable(&carepath_core::normalize(text)) {
            debug!("Empty or non-text input, skipping model");
            return self.stamp(ClassificationResult::unknown(), 0);
        }

        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| self.model.predict(text)))
            .unwrap_or_else(|_| Err(Error::classifier("model panicked during prediction")))
            .and_then(|prediction| {
                if let Some(scores) = &prediction.all_scores {
                    debug!(model = %self.model.name(), ?scores, "Class scores");
                }
                validate(prediction)
            });
        let latency_us = start.elapsed().as_micros() as u64;

        match outcome {
            Ok(result) => self.stamp(result, latency_us),
            Err(e) => {
                warn!(model = %self.model.name(), error = %e, "Classifier fault, treating as zero confidence");
                let mut result = self.stamp(ClassificationResult::unknown(), latency_us);
                result.fault = Some(e.to_string());
                result
            }
        }
    }

    fn stamp(&self, mut result: ClassificationResult, latency_us: u64) -> ClassificationResult {
        result.model = self.model.name().to_string();
        result.latency_us = latency_us;
        result
    }
}

/// Map raw model output onto the taxonomy, rejecting malformed results
fn validate(prediction: Prediction) -> Result<ClassificationResult> {
    let category: Category = prediction.label.parse()?;
    if !category.is_answerable() {
        return Err(Error::classifier(format!(
            "model produced reserved label '{}'",
            category
        )));
    }

    let score = prediction.score;
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(Error::classifier(format!(
            "model produced confidence {} outside [0, 1]",
            score
        )));
    }

    Ok(ClassificationResult::new(
        category,
        score.min(CLASSIFIER_CONFIDENCE_CEILING),
    ))
}

/// Decides whether a classification is trusted over the generic fallback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidencePolicy {
    threshold: f32,
}

impl ConfidencePolicy {
    /// Create a policy
    ///
    /// The threshold must lie in [0, `CLASSIFIER_CONFIDENCE_CEILING`]; anything
    /// higher could never be reached by a capped confidence.
    pub fn new(threshold: f32) -> Result<Self> {
        if !threshold.is_finite() || !(0.0..=CLASSIFIER_CONFIDENCE_CEILING).contains(&threshold) {
            return Err(Error::config(format!(
                "confidence threshold {} outside [0, {}]",
                threshold, CLASSIFIER_CONFIDENCE_CEILING
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Trusted when the category is answerable and confidence reaches the threshold
    pub fn accepts(&self, result: &ClassificationResult) -> bool {
        result.fault.is_none()
            && result.category.is_answerable()
            && result.exceeds_threshold(self.threshold)
    }
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}
