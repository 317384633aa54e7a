//! Duplicate-question filtering.
//!
//! A cheap lexical heuristic, not NLP. Early in an interview it is strict so
//! the first questions stay clearly distinct; once a couple of turns exist it
//! relaxes and only looks at the most recent questions, which lets follow-ups
//! cover adjacent ground.

use std::collections::BTreeSet;

use tracing::debug;

use crate::workspace::DuplicateSettings;

/// Coarse intent buckets detected by keyword membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SemanticBucket {
    Importance,
    Requirements,
    Usage,
    Preference,
    Decision,
}

/// Keywords ending in `*` match as prefixes; the rest match whole words or
/// phrases.
const BUCKET_KEYWORDS: &[(SemanticBucket, &[&str])] = &[
    (
        SemanticBucket::Importance,
        &["importan*", "matter*", "priorit*", "essential", "crucial", "key", "most"],
    ),
    (
        SemanticBucket::Requirements,
        &["need*", "requir*", "must", "necessar*", "have to", "has to"],
    ),
    (
        SemanticBucket::Usage,
        &["use", "uses", "using", "usage", "how often", "purpose", "for what", "frequen*"],
    ),
    (
        SemanticBucket::Preference,
        &["prefer*", "like", "favorite", "favourite", "rather", "enjoy*"],
    ),
    (
        SemanticBucket::Decision,
        &["choos*", "choice*", "decid*", "decision*", "pick*", "select*", "consider*"],
    ),
];

const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "any", "are", "as", "at", "be", "by", "can", "could", "do", "does",
    "for", "from", "have", "how", "i", "if", "in", "is", "it", "me", "my", "of", "on", "or",
    "should", "so", "that", "the", "there", "these", "this", "those", "to", "was", "we", "what",
    "when", "where", "which", "who", "why", "will", "with", "would", "you", "your", "yours",
];

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalized(text: &str) -> String {
    words(text).join(" ")
}

/// Buckets whose keywords appear in `text`.
pub fn semantic_buckets(text: &str) -> BTreeSet<SemanticBucket> {
    let tokens = words(text);
    let joined = format!(" {} ", tokens.join(" "));
    BUCKET_KEYWORDS
        .iter()
        .filter(|(_, keywords)| {
            keywords.iter().any(|keyword| {
                if let Some(stem) = keyword.strip_suffix('*') {
                    tokens.iter().any(|token| token.starts_with(stem))
                } else {
                    joined.contains(&format!(" {keyword} "))
                }
            })
        })
        .map(|(bucket, _)| *bucket)
        .collect()
}

/// Words left after dropping stop words.
pub fn meaningful_words(text: &str) -> BTreeSet<String> {
    words(text)
        .into_iter()
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
        .collect()
}

fn char_set(text: &str) -> BTreeSet<char> {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// `|a ∩ b| / max(|a|, |b|)`; zero when both are empty.
fn overlap_ratio<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let larger = a.len().max(b.len());
    if larger == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / larger as f64
}

pub fn word_overlap(a: &str, b: &str) -> f64 {
    overlap_ratio(&meaningful_words(a), &meaningful_words(b))
}

pub fn char_overlap(a: &str, b: &str) -> f64 {
    overlap_ratio(&char_set(a), &char_set(b))
}

/// Decides whether a candidate question is too close to earlier ones.
pub trait SimilarityStrategy: Send + Sync {
    fn is_similar(&self, candidate: &str, asked: &[&str], turn_count: usize) -> bool;
}

/// Bucket + word + character overlap with turn-dependent strictness.
#[derive(Debug, Clone)]
pub struct KeywordOverlapStrategy {
    settings: DuplicateSettings,
}

impl KeywordOverlapStrategy {
    pub fn new(settings: DuplicateSettings) -> Self {
        Self { settings }
    }

    fn strict_match(&self, candidate: &str, previous: &str) -> bool {
        let shared = semantic_buckets(candidate)
            .intersection(&semantic_buckets(previous))
            .count();
        shared >= self.settings.strict_min_shared_buckets
            || word_overlap(candidate, previous) > self.settings.strict_word_overlap
            || char_overlap(candidate, previous) > self.settings.strict_char_overlap
    }

    fn lenient_match(&self, candidate: &str, previous: &str) -> bool {
        let candidate_buckets = semantic_buckets(candidate);
        let same_buckets =
            !candidate_buckets.is_empty() && candidate_buckets == semantic_buckets(previous);
        (same_buckets && word_overlap(candidate, previous) > self.settings.lenient_word_overlap)
            || char_overlap(candidate, previous) > self.settings.lenient_char_overlap
    }
}

impl Default for KeywordOverlapStrategy {
    fn default() -> Self {
        Self::new(DuplicateSettings::default())
    }
}

impl SimilarityStrategy for KeywordOverlapStrategy {
    fn is_similar(&self, candidate: &str, asked: &[&str], turn_count: usize) -> bool {
        if turn_count < self.settings.strict_turn_limit {
            asked
                .iter()
                .any(|previous| self.strict_match(candidate, previous))
        } else {
            let window_start = asked.len().saturating_sub(self.settings.lenient_window);
            asked[window_start..]
                .iter()
                .any(|previous| self.lenient_match(candidate, previous))
        }
    }
}

pub struct DuplicateFilter {
    strategy: Box<dyn SimilarityStrategy>,
}

impl DuplicateFilter {
    pub fn new(strategy: Box<dyn SimilarityStrategy>) -> Self {
        Self { strategy }
    }

    pub fn with_settings(settings: DuplicateSettings) -> Self {
        Self::new(Box::new(KeywordOverlapStrategy::new(settings)))
    }

    /// Verbatim repeats (modulo case and punctuation) anywhere in history are
    /// always duplicates; everything else is up to the strategy.
    pub fn is_duplicate(&self, candidate: &str, asked: &[&str], turn_count: usize) -> bool {
        let key = normalized(candidate);
        if asked.iter().any(|previous| normalized(previous) == key) {
            debug!(candidate, "candidate repeats an earlier question verbatim");
            return true;
        }
        let similar = self.strategy.is_similar(candidate, asked, turn_count);
        if similar {
            debug!(candidate, turn_count, "candidate too similar to recent questions");
        }
        similar
    }
}

impl Default for DuplicateFilter {
    fn default() -> Self {
        Self::with_settings(DuplicateSettings::default())
    }
}
