//! Lightweight keyword model
//!
//! Used when no trained model artifact is configured. Scores each category by
//! keyword hits; confidence grows with the number of hits and shrinks when
//! hits are spread across categories.

use crate::classifier::{Classifier, Prediction};
use aho_corasick::{AhoCorasick, MatchKind};
use carepath_core::{Category, Error, Result};
use std::time::Instant;

const SLOTS: usize = Category::ANSWERABLE.len();

const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Mobility,
        &[
            "walk", "walking", "stand up", "standing up", "mobility", "stairs", "transfer",
            "wheelchair", "stiff", "unsteady",
        ],
    ),
    (
        Category::FallPrevention,
        &["fall", "fell", "falling", "trip", "slipped", "balance", "dizzy"],
    ),
    (
        Category::Medication,
        &[
            "medication", "medicine", "pill", "dose", "prescription", "side effect",
            "pharmacy", "tablet", "insulin",
        ],
    ),
    (
        Category::Nutrition,
        &[
            "eat", "appetite", "meal", "diet", "food", "weight loss", "hydration", "thirst",
            "dehydrat", "swallow",
        ],
    ),
    (
        Category::PersonalCare,
        &[
            "bath", "shower", "toilet", "incontinence", "dressing", "hygiene", "teeth",
            "skin", "washing",
        ],
    ),
    (
        Category::DementiaCare,
        &[
            "dementia", "alzheimer", "memory loss", "confused", "confusion", "forgetful",
            "agitated", "repeats",
        ],
    ),
    (
        Category::MentalHealth,
        &[
            "mental health", "depressed", "depression", "anxiety", "anxious", "lonely",
            "loneliness", "sad", "hopeless", "grief", "panic", "stress", "worried",
        ],
    ),
    (
        Category::CaregiverSupport,
        &[
            "caregiver", "caring for", "burnout", "respite", "exhausted", "overwhelmed",
            "support group", "guilt",
        ],
    ),
    (
        Category::Equipment,
        &[
            "grab bar", "hospital bed", "commode", "hoist", "lift chair", "shower chair",
            "ramp", "equipment", "walker", "cane", "rollator",
        ],
    ),
    (
        Category::General,
        &["doctor", "appointment", "health", "symptom", "nurse", "clinic"],
    ),
];

/// Keyword model over the category taxonomy
pub struct LexiconModel {
    name: String,
    matcher: AhoCorasick,
    labels: Vec<Category>,
}

impl LexiconModel {
    /// Create the model with the built-in keyword table
    pub fn new() -> Result<Self> {
        Self::with_name("lexicon")
    }

    /// Create with a custom name
    pub fn with_name(name: impl Into<String>) -> Result<Self> {
        let (labels, keywords): (Vec<Category>, Vec<&str>) = KEYWORDS
            .iter()
            .flat_map(|(category, words)| words.iter().map(move |w| (*category, *w)))
            .unzip();

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&keywords)
            .map_err(|e| Error::classifier(format!("Failed to build lexicon matcher: {}", e)))?;

        Ok(Self {
            name: name.into(),
            matcher,
            labels,
        })
    }

    fn hits(&self, text: &str) -> [u32; SLOTS] {
        let bytes = text.as_bytes();
        let mut hits = [0u32; SLOTS];

        for m in self.matcher.find_iter(text) {
            // Keywords act as word stems: they must start on a word boundary.
            if m.start() > 0 && bytes[m.start() - 1].is_ascii_alphanumeric() {
                continue;
            }
            let category = self.labels[m.pattern().as_usize()];
            if let Some(slot) = Category::ANSWERABLE.iter().position(|c| *c == category) {
                hits[slot] += 1;
            }
        }

        hits
    }
}

impl Classifier for LexiconModel {
    fn predict(&self, text: &str) -> Result<Prediction> {
        let start = Instant::now();
        let hits = self.hits(text);

        let total: u32 = hits.iter().sum();
        // First maximum wins, so ties resolve in taxonomy order.
        let (best_slot, best) = hits
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0), |acc, (i, h)| if h > acc.1 { (i, h) } else { acc });

        let score = if total == 0 {
            0.0
        } else {
            let share = best as f32 / total as f32;
            let strength = (0.3 + 0.25 * best as f32).min(0.95);
            share * strength
        };

        let all_scores = Category::ANSWERABLE
            .iter()
            .zip(hits.iter())
            .filter(|(_, h)| **h > 0)
            .map(|(c, h)| (c.as_str().to_string(), *h as f32 / total.max(1) as f32))
            .collect();

        Ok(Prediction {
            label: Category::ANSWERABLE[best_slot].as_str().to_string(),
            score,
            all_scores: Some(all_scores),
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
