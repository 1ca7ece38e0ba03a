//! Contextual scenario catalog and matcher
//!
//! The catalog is an ordered, versioned list of scenarios. A scenario matches
//! when any of its triggers is a substring of the normalized query; when
//! several match, the first-registered scenario wins.

use crate::classifier::ScenarioSource;
use aho_corasick::AhoCorasick;
use carepath_core::{Category, Error, Result};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("../data/scenarios.yaml");

/// Confidence reported for every scenario match.
///
/// Rule-based decisions are trusted fully; the classifier adapter caps model
/// confidence below this value.
pub const SCENARIO_CONFIDENCE: f32 = 0.95;

/// Ordered scenario catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCatalog {
    /// Catalog version
    pub version: String,

    /// Scenarios in priority order
    pub scenarios: Vec<ScenarioRecord>,
}

/// A single scenario in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Scenario identifier
    pub id: String,

    /// Category reported for responses from this scenario
    pub category: Category,

    /// What situation this scenario covers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Trigger phrases
    pub triggers: Vec<String>,

    /// Response templates
    pub templates: Vec<String>,

    /// Whether this scenario takes part in matching
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ScenarioCatalog {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let catalog: Self = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Check ids are unique and every scenario can both match and answer
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for scenario in &self.scenarios {
            if scenario.id.trim().is_empty() {
                return Err(Error::config("scenario with empty id"));
            }
            if !seen.insert(scenario.id.as_str()) {
                return Err(Error::config(format!(
                    "duplicate scenario id '{}'",
                    scenario.id
                )));
            }
            if !scenario.triggers.iter().any(|t| !t.trim().is_empty()) {
                return Err(Error::config(format!(
                    "scenario '{}' has no triggers",
                    scenario.id
                )));
            }
            if scenario.templates.iter().all(|t| t.trim().is_empty()) {
                return Err(Error::config(format!(
                    "scenario '{}' has no templates",
                    scenario.id
                )));
            }
            if !scenario.category.is_answerable() {
                return Err(Error::config(format!(
                    "scenario '{}' uses reserved category '{}'",
                    scenario.id, scenario.category
                )));
            }
        }

        Ok(())
    }

    /// Look up a scenario by id
    pub fn get(&self, id: &str) -> Option<&ScenarioRecord> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Number of scenarios
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// How a template is picked when a scenario has several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum TemplateSelection {
    /// Always the first template
    First,

    /// Cycle through templates per scenario
    RoundRobin,

    /// Uniform random choice from a seeded generator
    Seeded {
        #[serde(default = "default_seed")]
        seed: u64,
    },
}

impl Default for TemplateSelection {
    fn default() -> Self {
        Self::Seeded {
            seed: default_seed(),
        }
    }
}

enum Selector {
    First,
    RoundRobin(Vec<AtomicUsize>),
    Seeded(Mutex<StdRng>),
}

impl Selector {
    fn new(selection: TemplateSelection, scenarios: usize) -> Self {
        match selection {
            TemplateSelection::First => Self::First,
            TemplateSelection::RoundRobin => {
                Self::RoundRobin((0..scenarios).map(|_| AtomicUsize::new(0)).collect())
            }
            TemplateSelection::Seeded { seed } => {
                Self::Seeded(Mutex::new(StdRng::seed_from_u64(seed)))
            }
        }
    }

    fn pick(&self, scenario: usize, templates: usize) -> usize {
        if templates <= 1 {
            return 0;
        }
        match self {
            Self::First => 0,
            Self::RoundRobin(counters) => {
                counters[scenario].fetch_add(1, Ordering::Relaxed) % templates
            }
            Self::Seeded(rng) => rng.lock().gen_range(0..templates),
        }
    }
}

/// A scenario that won matching
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioMatch {
    /// Winning scenario id
    pub scenario_id: String,

    /// Category of the winning scenario
    pub category: Category,

    /// Selected response template, unformatted
    pub response_template: String,

    /// Always `SCENARIO_CONFIDENCE`
    pub confidence: f32,

    /// Trigger that matched first for the winning scenario
    pub trigger: String,
}

/// Scenario matcher over a fixed catalog
pub struct ScenarioMatcher {
    catalog: ScenarioCatalog,
    automaton: AhoCorasick,
    /// Scenario index for each automaton pattern
    owners: Vec<usize>,
    triggers: Vec<String>,
    selector: Selector,
}

impl ScenarioMatcher {
    /// Build a matcher for the catalog
    pub fn new(catalog: ScenarioCatalog, selection: TemplateSelection) -> Result<Self> {
        catalog.validate()?;

        let mut owners = Vec::new();
        let mut triggers = Vec::new();
        for (index, scenario) in catalog.scenarios.iter().enumerate() {
            if !scenario.enabled {
                continue;
            }
            for trigger in &scenario.triggers {
                let trigger = carepath_core::normalize(trigger);
                if trigger.is_empty() {
                    continue;
                }
                owners.push(index);
                triggers.push(trigger);
            }
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&triggers)
            .map_err(|e| Error::config(format!("Failed to build scenario matcher: {}", e)))?;

        let selector = Selector::new(selection, catalog.scenarios.len());

        Ok(Self {
            catalog,
            automaton,
            owners,
            triggers,
            selector,
        })
    }

    /// Matcher over the built-in catalog
    pub fn builtin(selection: TemplateSelection) -> Result<Self> {
        Self::new(ScenarioCatalog::builtin()?, selection)
    }

    /// The catalog this matcher was built from
    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }
}

impl ScenarioSource for ScenarioMatcher {
    fn match_query(&self, normalized: &str) -> Result<Option<ScenarioMatch>> {
        let matches = self
            .automaton
            .try_find_overlapping_iter(normalized)
            .map_err(|e| Error::scenario(format!("scenario scan failed: {}", e)))?;

        // Lowest scenario index wins; ties inside a scenario go to the earliest trigger.
        let winner = matches
            .map(|m| (self.owners[m.pattern().as_usize()], m.pattern().as_usize()))
            .min();

        let Some((index, pattern)) = winner else {
            return Ok(None);
        };

        let scenario = &self.catalog.scenarios[index];
        let templates: Vec<&String> = scenario
            .templates
            .iter()
            .filter(|t| !t.trim().is_empty())
            .collect();
        let choice = self.selector.pick(index, templates.len());

        debug!(
            scenario = %scenario.id,
            trigger = %self.triggers[pattern],
            template = choice,
            "Scenario matched"
        );

        Ok(Some(ScenarioMatch {
            scenario_id: scenario.id.clone(),
            category: scenario.category,
            response_template: templates[choice].trim_end().to_string(),
            confidence: SCENARIO_CONFIDENCE,
            trigger: self.triggers[pattern].clone(),
        }))
    }
}

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(yaml: &str) -> ScenarioCatalog {
        ScenarioCatalog::from_yaml(yaml).unwrap()
    }

    const OVERLAPPING: &str = r#"
version: test
scenarios:
  - id: first
    category: mobility
    triggers: ["out of bed"]
    templates: ["first template"]
  - id: second
    category: fall_prevention
    triggers: ["father", "bed"]
    templates: ["second template"]
"#;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = ScenarioCatalog::builtin().unwrap();
        assert!(catalog.len() >= 8);
        assert!(catalog.get("bed_mobility").is_some());
    }

    #[test]
    fn test_bed_mobility_example() {
        let matcher = ScenarioMatcher::builtin(TemplateSelection::First).unwrap();
        let found = matcher
            .match_query("my elderly father has trouble getting out of bed")
            .unwrap()
            .unwrap();

        assert_eq!(found.scenario_id, "bed_mobility");
        assert_eq!(found.category, Category::Mobility);
        assert_eq!(found.confidence, SCENARIO_CONFIDENCE);
        assert!(found.response_template.contains("- "));
    }

    #[test]
    fn test_no_match() {
        let matcher = ScenarioMatcher::builtin(TemplateSelection::First).unwrap();
        assert!(matcher.match_query("xyzzy quux").unwrap().is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let matcher =
            ScenarioMatcher::new(catalog(OVERLAPPING), TemplateSelection::First).unwrap();

        // "father" (second) appears before "out of bed" (first) in the text
        for _ in 0..10 {
            let found = matcher
                .match_query("my father cannot get out of bed")
                .unwrap()
                .unwrap();
            assert_eq!(found.scenario_id, "first");
        }

        let found = matcher.match_query("my father is fine").unwrap().unwrap();
        assert_eq!(found.scenario_id, "second");
    }

    #[test]
    fn test_disabled_scenario_skipped() {
        let mut cat = catalog(OVERLAPPING);
        cat.scenarios[0].enabled = false;
        let matcher = ScenarioMatcher::new(cat, TemplateSelection::First).unwrap();

        let found = matcher.match_query("get out of bed").unwrap().unwrap();
        assert_eq!(found.scenario_id, "second");
    }

    #[test]
    fn test_round_robin_cycles() {
        let yaml = r#"
version: test
scenarios:
  - id: multi
    category: general
    triggers: ["hello"]
    templates: ["a", "b", "c"]
"#;
        let matcher = ScenarioMatcher::new(catalog(yaml), TemplateSelection::RoundRobin).unwrap();
        let picks: Vec<String> = (0..4)
            .map(|_| matcher.match_query("hello").unwrap().unwrap().response_template)
            .collect();
        assert_eq!(picks, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let yaml = r#"
version: test
scenarios:
  - id: multi
    category: general
    triggers: ["hello"]
    templates: ["a", "b", "c", "d"]
"#;
        let run = || {
            let matcher = ScenarioMatcher::new(
                catalog(yaml),
                TemplateSelection::Seeded { seed: 7 },
            )
            .unwrap();
            (0..16)
                .map(|_| matcher.match_query("hello").unwrap().unwrap().response_template)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_validation_rejects_duplicates() {
        let yaml = r#"
version: test
scenarios:
  - id: same
    category: general
    triggers: ["a"]
    templates: ["x"]
  - id: same
    category: general
    triggers: ["b"]
    templates: ["y"]
"#;
        assert!(ScenarioCatalog::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validation_rejects_missing_templates() {
        let yaml = r#"
version: test
scenarios:
  - id: empty
    category: general
    triggers: ["a"]
    templates: []
"#;
        assert!(ScenarioCatalog::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validation_rejects_reserved_category() {
        let yaml = r#"
version: test
scenarios:
  - id: sneaky
    category: crisis
    triggers: ["a"]
    templates: ["x"]
"#;
        assert!(ScenarioCatalog::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_selection_config_parsing() {
        let parsed: TemplateSelection = serde_yaml::from_str("strategy: round_robin").unwrap();
        assert_eq!(parsed, TemplateSelection::RoundRobin);

        let parsed: TemplateSelection = serde_yaml::from_str("strategy: seeded").unwrap();
        assert_eq!(parsed, TemplateSelection::Seeded { seed: 42 });
    }
}
