//! Cleaning and validation of free-text city input.

use serde::Serialize;

/// Minimum length of a single-word query
pub const MIN_SINGLE_WORD_LEN: usize = 3;

/// Lowercase, letters and single spaces only.
///
/// Only [`normalize`] builds one, so the invariant holds everywhere a
/// `NormalizedQuery` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|w| !w.is_empty())
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }

    pub fn first_word(&self) -> Option<&str> {
        self.words().next()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase, drop everything but `a-z` and whitespace, collapse whitespace.
pub fn normalize(raw: &str) -> NormalizedQuery {
    let lowered = raw.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
        .collect();

    NormalizedQuery(kept.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Whether `raw` is worth sending to the geocoder.
///
/// Judged on the trimmed, lowercased input before anything is stripped:
/// it needs at least one letter, and a single word must be at least
/// [`MIN_SINGLE_WORD_LEN`] characters long. Multi-word input has no
/// per-word minimum.
pub fn validate(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    if !lowered.chars().any(|c| c.is_ascii_lowercase()) {
        return false;
    }

    let mut words = lowered.split_whitespace();
    match (words.next(), words.next()) {
        (Some(word), None) => word.chars().count() >= MIN_SINGLE_WORD_LEN,
        _ => true,
    }
}
