//! TF-IDF + multinomial naive Bayes inference
//!
//! Loads a model artifact exported by the training pipeline and runs inference
//! only. The artifact carries the fitted vocabulary, IDF weights, class log
//! priors and per-class feature log probabilities.

use crate::classifier::{Classifier, Prediction};
use carepath_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Serialized model artifact (JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayesArtifact {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub version: String,

    /// Class labels, index-aligned with priors and feature rows
    pub classes: Vec<String>,

    /// Term → feature index
    pub vocabulary: HashMap<String, usize>,

    /// Inverse document frequency per feature
    pub idf: Vec<f32>,

    /// Log prior per class
    pub class_log_prior: Vec<f32>,

    /// Log P(feature | class), one row per class
    pub feature_log_prob: Vec<Vec<f32>>,

    /// Longest word n-gram in the vocabulary
    #[serde(default = "default_ngram_max")]
    pub ngram_max: usize,

    /// Use 1 + ln(tf) instead of raw term counts
    #[serde(default)]
    pub sublinear_tf: bool,

    /// L2-normalize the TF-IDF vector
    #[serde(default = "default_true")]
    pub l2_normalize: bool,
}

impl NaiveBayesArtifact {
    /// Check shapes and values are consistent
    pub fn validate(&self) -> Result<()> {
        let features = self.idf.len();
        let classes = self.classes.len();

        if classes == 0 {
            return Err(Error::config("model artifact has no classes"));
        }
        if self.ngram_max == 0 {
            return Err(Error::config("ngram_max must be at least 1"));
        }
        if self.class_log_prior.len() != classes {
            return Err(Error::config(format!(
                "class_log_prior has {} entries for {} classes",
                self.class_log_prior.len(),
                classes
            )));
        }
        if self.feature_log_prob.len() != classes {
            return Err(Error::config(format!(
                "feature_log_prob has {} rows for {} classes",
                self.feature_log_prob.len(),
                classes
            )));
        }
        if let Some(row) = self.feature_log_prob.iter().find(|r| r.len() != features) {
            return Err(Error::config(format!(
                "feature_log_prob row has {} columns, expected {}",
                row.len(),
                features
            )));
        }
        if let Some((term, index)) = self.vocabulary.iter().find(|(_, i)| **i >= features) {
            return Err(Error::config(format!(
                "vocabulary term '{}' maps to feature {} of {}",
                term, index, features
            )));
        }

        let all_finite = self
            .idf
            .iter()
            .chain(self.class_log_prior.iter())
            .chain(self.feature_log_prob.iter().flatten())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(Error::config("model artifact contains non-finite weights"));
        }

        Ok(())
    }
}

/// Inference-only naive Bayes text model
pub struct NaiveBayesModel {
    artifact: NaiveBayesArtifact,
}

impl NaiveBayesModel {
    /// Create from a validated artifact
    pub fn new(artifact: NaiveBayesArtifact) -> Result<Self> {
        artifact.validate()?;
        info!(
            model = %artifact.name,
            version = %artifact.version,
            classes = artifact.classes.len(),
            features = artifact.idf.len(),
            "Loaded naive Bayes model"
        );
        Ok(Self { artifact })
    }

    /// Load from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Class labels
    pub fn classes(&self) -> &[String] {
        &self.artifact.classes
    }

    /// TF-IDF feature vector as sparse (index, weight) pairs
    fn features(&self, text: &str) -> Vec<(usize, f32)> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| t.chars().count() >= 2)
            .collect();

        let mut counts: HashMap<usize, f32> = HashMap::new();
        for n in 1..=self.artifact.ngram_max {
            for window in tokens.windows(n) {
                let term = window.join(" ");
                if let Some(&index) = self.artifact.vocabulary.get(&term) {
                    *counts.entry(index).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut weights: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(index, tf)| {
                let tf = if self.artifact.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (index, tf * self.artifact.idf[index])
            })
            .collect();

        if self.artifact.l2_normalize {
            let norm = weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                for (_, w) in &mut weights {
                    *w /= norm;
                }
            }
        }

        weights
    }
}

impl Classifier for NaiveBayesModel {
    fn predict(&self, text: &str) -> Result<Prediction> {
        let start = Instant::now();
        let features = self.features(text);

        let joint: Vec<f32> = self
            .artifact
            .class_log_prior
            .iter()
            .zip(&self.artifact.feature_log_prob)
            .map(|(prior, row)| prior + features.iter().map(|(i, w)| w * row[*i]).sum::<f32>())
            .collect();

        // Softmax over joint log likelihoods
        let max = joint.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = joint.iter().map(|j| (j - max).exp()).collect();
        let total: f32 = exp.iter().sum();
        let probs: Vec<f32> = exp.iter().map(|e| e / total).collect();

        let (best, score) = probs
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |acc, (i, p)| if p > acc.1 { (i, p) } else { acc });

        let all_scores = self
            .artifact
            .classes
            .iter()
            .cloned()
            .zip(probs.iter().copied())
            .collect();

        Ok(Prediction {
            label: self.artifact.classes[best].clone(),
            score,
            all_scores: Some(all_scores),
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        &self.artifact.name
    }
}

fn default_name() -> String {
    "naive-bayes".to_string()
}

fn default_ngram_max() -> usize {
    1
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact_json() -> String {
        let half = 0.5f32.ln();
        let high = 0.9f32.ln();
        let low = 0.1f32.ln();
        format!(
            r#"{{
                "name": "test-nb",
                "version": "1",
                "classes": ["medication", "mobility"],
                "vocabulary": {{"pill": 0, "walk": 1, "side effects": 2}},
                "idf": [1.0, 1.0, 2.0],
                "class_log_prior": [{half}, {half}],
                "feature_log_prob": [[{high}, {low}, {high}], [{low}, {high}, {low}]],
                "ngram_max": 2
            }}"#
        )
    }

    #[test]
    fn test_predicts_dominant_class() {
        let model = NaiveBayesModel::from_json(&artifact_json()).unwrap();
        let prediction = model.predict("Which PILL is this?").unwrap();

        assert_eq!(prediction.label, "medication");
        assert!((prediction.score - 0.9).abs() < 1e-4, "score {}", prediction.score);

        let prediction = model.predict("she likes to walk").unwrap();
        assert_eq!(prediction.label, "mobility");
    }

    #[test]
    fn test_bigram_features() {
        let model = NaiveBayesModel::from_json(&artifact_json()).unwrap();
        let prediction = model.predict("any side effects").unwrap();
        assert_eq!(prediction.label, "medication");
    }

    #[test]
    fn test_unseen_text_falls_back_to_priors() {
        let model = NaiveBayesModel::from_json(&artifact_json()).unwrap();
        let prediction = model.predict("xyzzy quux").unwrap();
        assert!((prediction.score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let json = r#"{
            "classes": ["a", "b"],
            "vocabulary": {"x": 0},
            "idf": [1.0],
            "class_log_prior": [-0.69],
            "feature_log_prob": [[-0.1], [-0.2]]
        }"#;
        assert!(NaiveBayesModel::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_vocabulary() {
        let json = r#"{
            "classes": ["a"],
            "vocabulary": {"x": 3},
            "idf": [1.0],
            "class_log_prior": [0.0],
            "feature_log_prob": [[-0.1]]
        }"#;
        assert!(NaiveBayesModel::from_json(json).is_err());
    }
}
