//! Close-match lookup over raw pattern text.
//!
//! Used as a last resort when no strategy clears its threshold: the input is
//! compared character by character with every pattern, so a misspelled word
//! like `"helo"` can still reach the `"hello"` pattern.

use crate::analysis::TextNormalizer;
use crate::corpus::IntentCorpus;
use crate::error::Result;

/// Default minimum similarity for a close match.
pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.4;

/// Ratcliff/Obershelp similarity of two strings in `[0, 1]`.
///
/// Twice the number of matching characters divided by the total length,
/// where matches are found by recursively taking the longest common block.
/// Two empty strings are identical.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let (start_a, start_b, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_characters(&a[..start_a], &b[..start_b])
        + matching_characters(&a[start_a + len..], &b[start_b + len..])
}

/// `(start in a, start in b, length)` of the earliest longest common block.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut previous = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let len = previous[j] + 1;
                current[j + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        previous = current;
    }
    best
}

/// Finds the pattern closest to an utterance.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    cutoff: f64,
    /// Normalized pattern text and the position of its intent.
    patterns: Vec<(String, usize)>,
}

impl FuzzyMatcher {
    pub fn new(corpus: &IntentCorpus, normalizer: &TextNormalizer, cutoff: f64) -> Result<Self> {
        let mut patterns = Vec::with_capacity(corpus.pattern_count());
        for (position, intent) in corpus.iter().enumerate() {
            for pattern in &intent.patterns {
                let normalized = normalizer.normalize(pattern)?;
                if !normalized.is_empty() {
                    patterns.push((normalized.text().to_string(), position));
                }
            }
        }
        Ok(FuzzyMatcher { cutoff, patterns })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Intent position and similarity of the closest pattern, if it reaches
    /// the cutoff. Earlier patterns win ties.
    pub fn closest(&self, text: &str) -> Option<(usize, f64)> {
        if text.is_empty() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (pattern, position) in &self.patterns {
            let ratio = sequence_ratio(text, pattern);
            if ratio >= self.cutoff && best.is_none_or(|(_, score)| ratio > score) {
                best = Some((*position, ratio));
            }
        }
        best
    }
}
