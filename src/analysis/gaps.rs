//! Information-gap detection.
//!
//! A small keyword table decides which personalization categories a query
//! touches; any relevant category missing from the profile is a gap.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::interview::ProfileValue;

/// How much a missing category hurts the downstream research task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPriority {
    Critical,
    Important,
    NiceToHave,
}

impl GapPriority {
    /// Weight recorded in `priority_factors` for answers in this category.
    pub fn weight(self) -> f64 {
        match self {
            GapPriority::Critical => 1.0,
            GapPriority::Important => 0.7,
            GapPriority::NiceToHave => 0.4,
        }
    }
}

impl fmt::Display for GapPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GapPriority::Critical => "critical",
            GapPriority::Important => "important",
            GapPriority::NiceToHave => "nice_to_have",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub category: String,
    pub priority: GapPriority,
}

struct CategorySpec {
    name: &'static str,
    priority: GapPriority,
    always_relevant: bool,
    triggers: &'static [&'static str],
}

/// Declaration order is the tie-break order for gaps.
const CATEGORY_TABLE: &[CategorySpec] = &[
    CategorySpec {
        name: "context",
        priority: GapPriority::Critical,
        always_relevant: true,
        triggers: &[],
    },
    CategorySpec {
        name: "goals",
        priority: GapPriority::Critical,
        always_relevant: false,
        triggers: &["goal", "achieve", "aim", "improve", "want to", "hoping", "trying to", "plan"],
    },
    CategorySpec {
        name: "use_case",
        priority: GapPriority::Important,
        always_relevant: false,
        triggers: &["use", "using", "for my", "purpose", "need", "work", "project", "daily"],
    },
    CategorySpec {
        name: "budget",
        priority: GapPriority::Important,
        always_relevant: false,
        triggers: &["budget", "cost", "price", "afford", "cheap", "expensive", "spend", "money", "$"],
    },
    CategorySpec {
        name: "timeline",
        priority: GapPriority::Important,
        always_relevant: false,
        triggers: &["when", "deadline", "soon", "timeline", "schedule", "urgent", "asap", "by next", "month", "week"],
    },
    CategorySpec {
        name: "constraints",
        priority: GapPriority::Important,
        always_relevant: false,
        triggers: &["must", "can't", "cannot", "limit", "restrict", "require", "avoid", "only", "without"],
    },
    CategorySpec {
        name: "experience_level",
        priority: GapPriority::NiceToHave,
        always_relevant: false,
        triggers: &["beginner", "learn", "expert", "experience", "new to", "skill", "advanced", "start"],
    },
    CategorySpec {
        name: "preferences",
        priority: GapPriority::NiceToHave,
        always_relevant: true,
        triggers: &["prefer", "like", "favorite", "style"],
    },
    CategorySpec {
        name: "location",
        priority: GapPriority::NiceToHave,
        always_relevant: false,
        triggers: &["where", "near", "city", "country", "local", "travel", "trip", "abroad"],
    },
];

/// Categories whose presence counts toward completion breadth.
pub const IMPORTANT_CATEGORIES: [&str; 8] = [
    "context",
    "goals",
    "use_case",
    "budget",
    "timeline",
    "constraints",
    "experience_level",
    "preferences",
];

/// Categories that are relevant for every query.
pub fn always_relevant_categories() -> impl Iterator<Item = &'static str> {
    CATEGORY_TABLE
        .iter()
        .filter(|spec| spec.always_relevant)
        .map(|spec| spec.name)
}

/// Priority of a known category; unknown categories are nice-to-have.
pub fn category_priority(category: &str) -> GapPriority {
    CATEGORY_TABLE
        .iter()
        .find(|spec| spec.name == category)
        .map(|spec| spec.priority)
        .unwrap_or(GapPriority::NiceToHave)
}

fn category_rank(category: &str) -> usize {
    CATEGORY_TABLE
        .iter()
        .position(|spec| spec.name == category)
        .unwrap_or(CATEGORY_TABLE.len())
}

/// Maps a free-text query to the categories it makes relevant.
///
/// The keyword implementation is a heuristic; anything smarter can slot in
/// behind this trait without the orchestrator noticing.
pub trait DomainClassifier: Send + Sync {
    fn relevant_categories(&self, query: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordDomainClassifier;

impl DomainClassifier for KeywordDomainClassifier {
    fn relevant_categories(&self, query: &str) -> Result<Vec<String>> {
        let normalized = query.to_lowercase();
        let tokens: Vec<&str> = normalized
            .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '$'))
            .filter(|token| !token.is_empty())
            .collect();
        let hits = CATEGORY_TABLE
            .iter()
            .filter(|spec| {
                spec.triggers
                    .iter()
                    .any(|trigger| trigger_matches(trigger, &normalized, &tokens))
            })
            .map(|spec| spec.name.to_string())
            .collect();
        Ok(hits)
    }
}

fn trigger_matches(trigger: &str, normalized: &str, tokens: &[&str]) -> bool {
    if trigger.contains(' ') || trigger == "$" {
        normalized.contains(trigger)
    } else {
        tokens.iter().any(|token| token.starts_with(trigger))
    }
}

pub struct GapAnalyzer {
    classifier: Box<dyn DomainClassifier>,
    max_gaps: usize,
}

impl GapAnalyzer {
    pub fn new(classifier: Box<dyn DomainClassifier>, max_gaps: usize) -> Self {
        Self {
            classifier,
            max_gaps,
        }
    }

    pub fn keyword(max_gaps: usize) -> Self {
        Self::new(Box::new(KeywordDomainClassifier), max_gaps)
    }

    /// Returns missing categories for `query`, highest priority first.
    ///
    /// Classifier failures degrade to the always-relevant categories.
    pub fn identify_gaps(&self, query: &str, profile: &BTreeMap<String, ProfileValue>) -> Vec<Gap> {
        let classified = match self.classifier.relevant_categories(query) {
            Ok(categories) => categories,
            Err(err) => {
                warn!(error = %err, "domain classification failed; using default gap set");
                Vec::new()
            }
        };
        let mut relevant: Vec<String> = Vec::new();
        let defaults = always_relevant_categories().map(str::to_string);
        for category in classified.into_iter().chain(defaults) {
            if !relevant.contains(&category) {
                relevant.push(category);
            }
        }

        let mut gaps: Vec<Gap> = relevant
            .into_iter()
            .filter(|category| {
                profile
                    .get(category)
                    .map(ProfileValue::is_empty)
                    .unwrap_or(true)
            })
            .map(|category| Gap {
                priority: category_priority(&category),
                category,
            })
            .collect();
        // Stable sort keeps classifier order for categories outside the table.
        gaps.sort_by_key(|gap| (gap.priority, category_rank(&gap.category)));
        gaps.truncate(self.max_gaps);
        gaps
    }
}
