//! Turns a raw answer into a profile value and a confidence estimate.

use std::collections::BTreeMap;

use crate::interview::ProfileValue;

const VAGUE_ANSWERS: &[&str] = &[
    "not sure", "no idea", "don't know", "dont know", "idk", "whatever", "no preference",
    "doesn't matter", "dunno", "n/a",
];

const VAGUE_CONFIDENCE: f64 = 0.2;
const LIST_ITEM_MAX_WORDS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedAnswer {
    /// `None` when the answer carried nothing worth storing.
    pub value: Option<ProfileValue>,
    pub confidence: f64,
}

pub fn extract(answer: &str) -> ExtractedAnswer {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return ExtractedAnswer {
            value: None,
            confidence: 0.0,
        };
    }
    ExtractedAnswer {
        value: Some(shape(trimmed)),
        confidence: answer_confidence(trimmed),
    }
}

/// Vague answers score low; otherwise confidence grows with word count.
pub fn answer_confidence(answer: &str) -> f64 {
    let lowered = answer.to_lowercase();
    let words = answer.split_whitespace().count();
    if words <= 6 && VAGUE_ANSWERS.iter().any(|phrase| lowered.contains(phrase)) {
        return VAGUE_CONFIDENCE;
    }
    (0.3 + words as f64 / 20.0).min(1.0)
}

fn shape(answer: &str) -> ProfileValue {
    if let Some(map) = as_key_values(answer) {
        return ProfileValue::Map(map);
    }
    if let Some(items) = as_short_list(answer) {
        return ProfileValue::List(items);
    }
    ProfileValue::text(answer)
}

/// `key: value` pairs separated by `;` or newlines, at least two of them.
fn as_key_values(answer: &str) -> Option<BTreeMap<String, ProfileValue>> {
    let parts: Vec<&str> = answer
        .split(|c| c == ';' || c == '\n')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() < 2 {
        return None;
    }
    let mut map = BTreeMap::new();
    for part in parts {
        let (key, value) = part.split_once(':')?;
        let key = key.trim().to_lowercase().replace(' ', "_");
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            return None;
        }
        map.insert(key, ProfileValue::text(value));
    }
    Some(map)
}

/// A short enumeration such as "hiking, cycling and climbing".
fn as_short_list(answer: &str) -> Option<Vec<String>> {
    if answer.ends_with('.') && answer.matches('.').count() > 1 {
        return None;
    }
    let normalized = answer
        .trim_end_matches('.')
        .replace(" and ", ",")
        .replace(';', ",");
    let items: Vec<String> = normalized
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    let short_items = items
        .iter()
        .all(|item| item.split_whitespace().count() <= LIST_ITEM_MAX_WORDS);
    (items.len() >= 2 && short_items).then_some(items)
}
