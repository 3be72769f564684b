//! Text-to-item matching.
//!
//! Matching runs in two passes. The exact pass looks for any item name as a
//! case-insensitive substring of the message. The fuzzy pass only runs when
//! the exact pass fails and compares individual words of the message against
//! the longer item names, so short words like "nine" never match "sine".
use crate::catalog::Item;
use crate::config::GameConfig;

/// Result of matching one message against one item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchResult<'a> {
    /// The message names the item; carries the name that matched.
    Matched(&'a str),
    /// The message does not name the item but is an explicit catch attempt.
    Attempted,
    /// Ordinary chatter.
    Unrelated,
}

/// Word that signals an explicit catch attempt.
pub const CATCH_WORD: &str = "catch";

/// Normalized indel similarity in `[0, 1]`: `2 * LCS(a, b) / (|a| + |b|)`.
///
/// Lengths are counted in Unicode scalar values. Two empty strings are
/// considered identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Splits on whitespace, strips surrounding ASCII punctuation, lowercases.
///
/// Tokens left empty after stripping are dropped.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

/// Fuzzy pass on its own: first (token, name) pair over the threshold.
///
/// Tokens are tried in message order and, for each token, names in item
/// order. Both must be longer than `config.fuzzy_min_len` characters.
pub fn fuzzy_match<'a>(item: &'a Item, text: &str, config: &GameConfig) -> Option<&'a str> {
    let min = config.fuzzy_min_len;
    let candidates: Vec<_> = item
        .names()
        .iter()
        .filter(|n| n.folded().chars().count() > min)
        .collect();
    if candidates.is_empty() {
        return None;
    }

    tokenize(text)
        .filter(|token| token.chars().count() > min)
        .find_map(|token| {
            candidates
                .iter()
                .copied()
                .find(|n| similarity(&token, n.folded()) >= config.fuzzy_threshold)
                .map(|n| n.name())
        })
}

/// Matches `text` against `item`: exact pass, then fuzzy pass, then the
/// catch-word check.
pub fn match_item<'a>(item: &'a Item, text: &str, config: &GameConfig) -> MatchResult<'a> {
    if let Some(name) = item.exact_match(text) {
        return MatchResult::Matched(name);
    }
    if let Some(name) = fuzzy_match(item, text, config) {
        return MatchResult::Matched(name);
    }
    if text.to_lowercase().contains(CATCH_WORD) {
        return MatchResult::Attempted;
    }
    MatchResult::Unrelated
}
