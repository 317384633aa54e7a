//! Deterministic fallback questions keyed by gap category.
//!
//! Used whenever the proposer is down, keeps producing duplicates, or returns
//! garbage. Selection never returns an empty string.

use crate::analysis::Gap;

/// Two phrasings per category so a gap can be asked about twice without a verbatim repeat.
const CATEGORY_TEMPLATES: &[(&str, [&str; 2])] = &[
    (
        "context",
        [
            "Could you tell me a bit about your situation and what prompted this request?",
            "What background should I keep in mind while researching this for you?",
        ],
    ),
    (
        "goals",
        [
            "What outcome would make this research a success for you?",
            "If this goes well, what will you be able to do afterwards?",
        ],
    ),
    (
        "use_case",
        [
            "How do you plan to use the results day to day?",
            "In what setting will you apply this, and how often?",
        ],
    ),
    (
        "budget",
        [
            "What budget range are you working with?",
            "Is there a price point you definitely do not want to exceed?",
        ],
    ),
    (
        "timeline",
        [
            "When do you need this decided or in place?",
            "Are there any dates or deadlines I should plan around?",
        ],
    ),
    (
        "constraints",
        [
            "Are there any hard limits or deal-breakers I should respect?",
            "Is there anything you want me to rule out from the start?",
        ],
    ),
    (
        "experience_level",
        [
            "How familiar are you with this topic already?",
            "Should I pitch the findings at a beginner, intermediate, or expert level?",
        ],
    ),
    (
        "preferences",
        [
            "Do you have any personal preferences that should shape the recommendations?",
            "Are there brands, styles, or approaches you tend to favor or avoid?",
        ],
    ),
    (
        "location",
        [
            "Where are you based, or where will this take place?",
            "Does your location limit which options are realistic?",
        ],
    ),
];

const GENERIC_TEMPLATES: &[&str] = &[
    "Is there anything else I should know before I start researching?",
    "What would you want me to double-check before presenting results?",
];

/// Last-resort question when every template has already been used.
pub const EXHAUSTED_QUESTION: &str =
    "Anything else you'd like to add before I start the research?";

pub const ENDING_EARLY_NOTICE: &str =
    "I've run out of new questions to ask, so I'll wrap up the interview here.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateQuestion {
    pub text: String,
    pub category: String,
    /// Set when no unused template remained; callers should end the interview.
    pub exhausted: bool,
}

pub fn templates_for(category: &str) -> Option<&'static [&'static str; 2]> {
    CATEGORY_TEMPLATES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, templates)| templates)
}

fn generic_for(category: &str) -> String {
    format!(
        "What else should I know about your {}?",
        category.replace('_', " ")
    )
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Picks the first template not yet asked, walking gaps in priority order.
pub fn fallback_question(gaps: &[Gap], asked: &[&str]) -> TemplateQuestion {
    let asked_keys: Vec<String> = asked.iter().map(|q| normalize(q)).collect();
    let unused = |text: &str| !asked_keys.contains(&normalize(text));

    for gap in gaps {
        let candidates: Vec<String> = match templates_for(&gap.category) {
            Some(templates) => templates.iter().map(|t| t.to_string()).collect(),
            None => vec![generic_for(&gap.category)],
        };
        if let Some(text) = candidates.into_iter().find(|text| unused(text)) {
            return TemplateQuestion {
                text,
                category: gap.category.clone(),
                exhausted: false,
            };
        }
    }

    if let Some(text) = GENERIC_TEMPLATES.iter().find(|text| unused(text)) {
        return TemplateQuestion {
            text: text.to_string(),
            category: "context".into(),
            exhausted: false,
        };
    }

    TemplateQuestion {
        text: EXHAUSTED_QUESTION.to_string(),
        category: "context".into(),
        exhausted: true,
    }
}
