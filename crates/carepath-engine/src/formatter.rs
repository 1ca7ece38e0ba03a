//! Response formatter
//!
//! Assembles the final response text in a fixed order:
//! 1. Core guidance, with "- " bullet lines rendered as numbered steps
//! 2. Equipment or professional-resource note, when the category has one
//! 3. Medical disclaimer (never for crisis responses)
//! 4. Emergency contacts: full list for crisis, softer wording for mental-health-adjacent categories

use carepath_core::{Category, Method};

/// Substring present in every non-crisis response
pub const DISCLAIMER_MARKER: &str = "Medical disclaimer:";

/// Substring present in every crisis response
pub const EMERGENCY_MARKER: &str = "988";

const DISCLAIMER: &str = "Medical disclaimer: This is general information for caregivers, not a \
substitute for professional medical advice, diagnosis or treatment. Always consult a qualified \
healthcare provider about specific health concerns.";

const CRISIS_RESOURCES: &str = "If you are in immediate danger, call 911 now.\n\
Call or text 988 to reach the Suicide & Crisis Lifeline, available 24/7.\n\
You can also text HOME to 741741 to reach the Crisis Text Line.";

const SOFT_RESOURCES: &str = "If you or the person you care for ever feel unsafe or unable to cope, \
you can call or text 988 at any time, or call 911 in an emergency.";

const EQUIPMENT_NOTE: &str = "Equipment note: An occupational or physical therapist can recommend \
and fit aids such as grab bars, transfer boards, walkers or shower chairs. Ask your doctor for a referral.";

const PHARMACIST_NOTE: &str = "Professional resource: A pharmacist can review all current \
medications for interactions and help simplify the dosing schedule.";

const DIETITIAN_NOTE: &str = "Professional resource: A dietitian or speech and language therapist \
can assess eating, drinking and swallowing needs.";

const DEMENTIA_NOTE: &str = "Professional resource: Local dementia and Alzheimer's organizations \
offer care consultants, helplines and support groups.";

/// Formats response text for every decision path
#[derive(Debug, Clone, Default)]
pub struct ResponseFormatter;

impl ResponseFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Build the final response text
    pub fn format(&self, core_text: &str, method: Method, category: Category) -> String {
        let mut sections = vec![number_steps(core_text.trim())];

        if method == Method::Crisis {
            sections.push(CRISIS_RESOURCES.to_string());
            return sections.join("\n\n");
        }

        if let Some(note) = resource_note(category) {
            sections.push(note.to_string());
        }

        sections.push(DISCLAIMER.to_string());

        if category.is_mental_health_adjacent() {
            sections.push(SOFT_RESOURCES.to_string());
        }

        sections.join("\n\n")
    }
}

/// Equipment or professional-resource note for a category
fn resource_note(category: Category) -> Option<&'static str> {
    match category {
        Category::Mobility
        | Category::FallPrevention
        | Category::PersonalCare
        | Category::Equipment => Some(EQUIPMENT_NOTE),
        Category::Medication => Some(PHARMACIST_NOTE),
        Category::Nutrition => Some(DIETITIAN_NOTE),
        Category::DementiaCare => Some(DEMENTIA_NOTE),
        _ => None,
    }
}

/// Render "- " and "* " bullet lines as "1. ", "2. ", ...
///
/// Numbering restarts after any non-bullet line.
pub fn number_steps(text: &str) -> String {
    let mut step = 0;

    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            match trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                Some(rest) => {
                    step += 1;
                    format!("{}. {}", step, rest.trim())
                }
                None => {
                    step = 0;
                    line.trim_end().to_string()
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_steps() {
        let text = "Intro:\n- one\n- two\n* three\nOutro\n- again";
        assert_eq!(
            number_steps(text),
            "Intro:\n1. one\n2. two\n3. three\nOutro\n1. again"
        );
    }

    #[test]
    fn test_crisis_has_resources_and_no_disclaimer() {
        let text = ResponseFormatter::new().format("core", Method::Crisis, Category::Crisis);
        assert!(text.starts_with("core"));
        assert!(text.contains(EMERGENCY_MARKER));
        assert!(text.contains("911"));
        assert!(!text.contains(DISCLAIMER_MARKER));
    }

    #[test]
    fn test_section_order() {
        let text = ResponseFormatter::new().format(
            "Guidance text",
            Method::MlClassification,
            Category::Mobility,
        );

        let guidance = text.find("Guidance text").unwrap();
        let note = text.find("Equipment note").unwrap();
        let disclaimer = text.find(DISCLAIMER_MARKER).unwrap();
        assert!(guidance < note && note < disclaimer);
        assert!(!text.contains(EMERGENCY_MARKER));
    }

    #[test]
    fn test_soft_resources_after_disclaimer() {
        let text = ResponseFormatter::new().format(
            "Feeling low",
            Method::MlClassification,
            Category::MentalHealth,
        );

        let disclaimer = text.find(DISCLAIMER_MARKER).unwrap();
        let resources = text.find(EMERGENCY_MARKER).unwrap();
        assert!(disclaimer < resources);
    }

    #[test]
    fn test_fallback_has_disclaimer_without_note() {
        let text = ResponseFormatter::new().format("Not sure", Method::Fallback, Category::General);
        assert!(text.contains(DISCLAIMER_MARKER));
        assert!(!text.contains("Equipment note"));
        assert!(!text.contains("Professional resource"));
    }
}
