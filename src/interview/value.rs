//! Heterogeneous profile values collected during an interview.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Value stored under a profile category.
///
/// Serialized untagged so persisted sessions stay plain JSON: a string, an
/// array of strings, or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, ProfileValue>),
}

impl ProfileValue {
    pub fn text(value: impl Into<String>) -> Self {
        ProfileValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ProfileValue::Text(text) => text.trim().is_empty(),
            ProfileValue::List(items) => items.iter().all(|item| item.trim().is_empty()),
            ProfileValue::Map(entries) => entries.is_empty(),
        }
    }

    /// Folds `incoming` into `self` without dropping anything already known.
    pub fn merge(self, incoming: ProfileValue) -> ProfileValue {
        match (self, incoming) {
            (existing, incoming) if existing.is_empty() => incoming,
            (existing, incoming) if incoming.is_empty() => existing,
            (ProfileValue::Text(a), ProfileValue::Text(b)) => {
                if a == b {
                    ProfileValue::Text(a)
                } else {
                    ProfileValue::List(vec![a, b])
                }
            }
            (ProfileValue::List(mut items), ProfileValue::Text(b)) => {
                push_unique(&mut items, b);
                ProfileValue::List(items)
            }
            (ProfileValue::Text(a), ProfileValue::List(more)) => {
                let mut items = vec![a];
                for item in more {
                    push_unique(&mut items, item);
                }
                ProfileValue::List(items)
            }
            (ProfileValue::List(mut items), ProfileValue::List(more)) => {
                for item in more {
                    push_unique(&mut items, item);
                }
                ProfileValue::List(items)
            }
            (ProfileValue::Map(mut entries), ProfileValue::Map(more)) => {
                for (key, value) in more {
                    let merged = match entries.remove(&key) {
                        Some(existing) => existing.merge(value),
                        None => value,
                    };
                    entries.insert(key, merged);
                }
                ProfileValue::Map(entries)
            }
            (ProfileValue::Map(mut entries), other) => {
                let notes = entries
                    .remove("notes")
                    .map(|existing| existing.merge(other.clone()))
                    .unwrap_or(other);
                entries.insert("notes".into(), notes);
                ProfileValue::Map(entries)
            }
            (other, ProfileValue::Map(mut entries)) => {
                let notes = entries
                    .remove("notes")
                    .map(|existing| other.clone().merge(existing))
                    .unwrap_or(other);
                entries.insert("notes".into(), notes);
                ProfileValue::Map(entries)
            }
        }
    }

    /// Single-line rendering used in prompts and summaries, cut at `max_chars`.
    pub fn summary(&self, max_chars: usize) -> String {
        let rendered = match self {
            ProfileValue::Text(text) => text.trim().to_string(),
            ProfileValue::List(items) => items.join(", "),
            ProfileValue::Map(entries) => entries
                .iter()
                .map(|(key, value)| format!("{key}: {}", value.summary(max_chars)))
                .collect::<Vec<_>>()
                .join("; "),
        };
        truncate_chars(&rendered, max_chars)
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.iter().any(|existing| existing.eq_ignore_ascii_case(&item)) {
        items.push(item);
    }
}

/// Truncates on a char boundary and marks the cut with an ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
