//! Core types for CarePath

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single inbound question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Raw text as typed by the user
    pub text: String,

    /// Optional session identifier supplied by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Query {
    /// Create a query without a session
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: None,
        }
    }

    /// Attach a session identifier
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Category taxonomy shared by the classifier and the response library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Mobility,
    FallPrevention,
    Medication,
    Nutrition,
    PersonalCare,
    DementiaCare,
    MentalHealth,
    CaregiverSupport,
    Equipment,
    General,
    /// Set only by the crisis path
    Crisis,
    /// Set for malformed input or unusable classifier output
    Unknown,
}

impl Category {
    /// Categories a classifier may legitimately predict
    pub const ANSWERABLE: [Category; 10] = [
        Category::Mobility,
        Category::FallPrevention,
        Category::Medication,
        Category::Nutrition,
        Category::PersonalCare,
        Category::DementiaCare,
        Category::MentalHealth,
        Category::CaregiverSupport,
        Category::Equipment,
        Category::General,
    ];

    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobility => "mobility",
            Self::FallPrevention => "fall_prevention",
            Self::Medication => "medication",
            Self::Nutrition => "nutrition",
            Self::PersonalCare => "personal_care",
            Self::DementiaCare => "dementia_care",
            Self::MentalHealth => "mental_health",
            Self::CaregiverSupport => "caregiver_support",
            Self::Equipment => "equipment",
            Self::General => "general",
            Self::Crisis => "crisis",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a classifier is allowed to produce this label
    pub fn is_answerable(&self) -> bool {
        !matches!(self, Self::Crisis | Self::Unknown)
    }

    /// Categories that get the softer emergency wording appended
    pub fn is_mental_health_adjacent(&self) -> bool {
        matches!(
            self,
            Self::MentalHealth | Self::CaregiverSupport | Self::DementiaCare
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let category = match label.as_str() {
            "mobility" => Self::Mobility,
            "fall_prevention" | "falls" => Self::FallPrevention,
            "medication" | "medications" => Self::Medication,
            "nutrition" => Self::Nutrition,
            "personal_care" | "hygiene" => Self::PersonalCare,
            "dementia_care" | "dementia" => Self::DementiaCare,
            "mental_health" => Self::MentalHealth,
            "caregiver_support" => Self::CaregiverSupport,
            "equipment" => Self::Equipment,
            "general" => Self::General,
            "crisis" => Self::Crisis,
            "unknown" => Self::Unknown,
            other => {
                return Err(crate::Error::classifier(format!(
                    "label '{}' is not in the category taxonomy",
                    other
                )))
            }
        };
        Ok(category)
    }
}

/// Which decision path produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Crisis,
    ContextualOverride,
    MlClassification,
    Fallback,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crisis => "crisis",
            Self::ContextualOverride => "contextual_override",
            Self::MlClassification => "ml_classification",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full result of one arbitration pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Final, formatted response text
    pub response_text: String,

    /// Category attributed to the response
    pub category: Category,

    /// Confidence of the winning path (0.0-1.0)
    pub confidence: f32,

    /// Decision path that produced the response
    pub method: Method,

    /// Whether this envelope was served from the response cache
    pub cached: bool,

    /// Wall-clock time spent producing this envelope
    pub generation_time_ms: f64,

    /// Mirrors `method == Crisis`
    pub is_crisis: bool,

    /// Scenario that won a contextual override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
}

impl ResponseEnvelope {
    /// Create a new envelope. `is_crisis` is derived from `method`.
    pub fn new(
        response_text: impl Into<String>,
        category: Category,
        confidence: f32,
        method: Method,
    ) -> Self {
        Self {
            response_text: response_text.into(),
            category,
            confidence,
            method,
            cached: false,
            generation_time_ms: 0.0,
            is_crisis: method == Method::Crisis,
            scenario_id: None,
        }
    }

    /// Record the winning scenario
    pub fn with_scenario(mut self, scenario_id: impl Into<String>) -> Self {
        self.scenario_id = Some(scenario_id.into());
        self
    }

    /// Set generation time in milliseconds
    pub fn with_generation_time(mut self, generation_time_ms: f64) -> Self {
        self.generation_time_ms = generation_time_ms;
        self
    }

    /// Copy of this envelope as served from cache
    pub fn as_cached(&self, generation_time_ms: f64) -> Self {
        Self {
            cached: true,
            generation_time_ms,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_crisis_flag_follows_method() {
        let crisis = ResponseEnvelope::new("call 988", Category::Crisis, 1.0, Method::Crisis);
        assert!(crisis.is_crisis);

        let fallback = ResponseEnvelope::new("text", Category::General, 0.2, Method::Fallback);
        assert!(!fallback.is_crisis);
    }

    #[test]
    fn test_envelope_serialization() {
        let envelope = ResponseEnvelope::new(
            "steps",
            Category::Mobility,
            0.95,
            Method::ContextualOverride,
        )
        .with_scenario("bed_mobility");

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["method"], "contextual_override");
        assert_eq!(json["category"], "mobility");
        assert_eq!(json["scenario_id"], "bed_mobility");
        assert_eq!(json["is_crisis"], false);
    }

    #[test]
    fn test_as_cached() {
        let envelope = ResponseEnvelope::new("text", Category::Nutrition, 0.8, Method::MlClassification)
            .with_generation_time(3.5);
        let cached = envelope.as_cached(0.01);

        assert!(cached.cached);
        assert_eq!(cached.response_text, envelope.response_text);
        assert_eq!(cached.generation_time_ms, 0.01);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("mental_health".parse::<Category>().unwrap(), Category::MentalHealth);
        assert_eq!("Fall-Prevention".parse::<Category>().unwrap(), Category::FallPrevention);
        assert!("astrology".parse::<Category>().is_err());

        for category in Category::ANSWERABLE {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
            assert!(category.is_answerable());
        }
        assert!(!Category::Crisis.is_answerable());
    }
}
