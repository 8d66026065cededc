//! Lexical-overlap scorer.

use tracing::debug;

use crate::analysis::{NormalizedText, TextNormalizer};
use crate::corpus::IntentCorpus;
use crate::error::Result;

use super::{IntentScorer, LEXICAL_THRESHOLD, PatternScore, Scores};

/// Added when one normalized surface text contains the other.
pub const SUBSTRING_BONUS: f64 = 0.3;

/// Jaccard coefficient of the term sets plus [`SUBSTRING_BONUS`], capped at 1.
///
/// The measure is symmetric. Either side having no terms scores 0.
pub fn lexical_similarity(a: &NormalizedText, b: &NormalizedText) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_terms = a.term_set();
    let b_terms = b.term_set();
    let intersection = a_terms.intersection(&b_terms).count();
    let union = a_terms.union(&b_terms).count();

    let mut score = intersection as f64 / union as f64;
    if a.text().contains(b.text()) || b.text().contains(a.text()) {
        score += SUBSTRING_BONUS;
    }

    score.min(1.0)
}

#[derive(Debug, Clone)]
struct PreparedPattern {
    intent: usize,
    pattern: usize,
    normalized: NormalizedText,
}

/// Scores every corpus pattern by [`lexical_similarity`].
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    patterns: Vec<PreparedPattern>,
}

impl LexicalScorer {
    /// Normalize every pattern of the corpus once.
    pub fn new(corpus: &IntentCorpus, normalizer: &TextNormalizer) -> Result<Self> {
        let mut patterns = Vec::with_capacity(corpus.pattern_count());
        for (intent_index, intent) in corpus.iter().enumerate() {
            for (pattern_index, pattern) in intent.patterns.iter().enumerate() {
                patterns.push(PreparedPattern {
                    intent: intent_index,
                    pattern: pattern_index,
                    normalized: normalizer.normalize(pattern)?,
                });
            }
        }

        debug!(patterns = patterns.len(), "prepared lexical scorer");
        Ok(LexicalScorer { patterns })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

impl IntentScorer for LexicalScorer {
    fn score(&self, input: &NormalizedText) -> Result<Scores> {
        let scores = self
            .patterns
            .iter()
            .map(|prepared| PatternScore {
                intent: prepared.intent,
                pattern: prepared.pattern,
                score: lexical_similarity(input, &prepared.normalized),
            })
            .collect();
        Ok(Scores::Patterns(scores))
    }

    fn default_threshold(&self) -> f64 {
        LEXICAL_THRESHOLD
    }

    fn name(&self) -> &str {
        "lexical"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::NormalizerConfig;
    use crate::corpus::Intent;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(NormalizerConfig::default()).unwrap()
    }

    fn similarity(a: &str, b: &str) -> f64 {
        let normalizer = normalizer();
        lexical_similarity(
            &normalizer.normalize(a).unwrap(),
            &normalizer.normalize(b).unwrap(),
        )
    }

    #[test]
    fn test_exact_match_is_maximal() {
        assert_eq!(similarity("apa itu DGA", "apa itu dga?"), 1.0);
    }

    #[test]
    fn test_substring_bonus_is_symmetric() {
        let forward = similarity("help", "help me please");
        let backward = similarity("help me please", "help");
        assert_eq!(forward, backward);
        // 1/3 overlap plus containment bonus
        assert!((forward - (1.0 / 3.0 + SUBSTRING_BONUS)).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_and_empty() {
        assert_eq!(similarity("xyzzy unrelated gibberish", "hello"), 0.0);
        assert_eq!(similarity("", "hello"), 0.0);
        assert_eq!(similarity("hello", "   "), 0.0);
    }

    #[test]
    fn test_scores_in_unit_interval() {
        let pairs = [
            ("analisis getaran mesin", "getaran"),
            ("gas gas gas", "gas"),
            ("a b c d", "c d e f"),
        ];
        for (a, b) in pairs {
            let score = similarity(a, b);
            assert!((0.0..=1.0).contains(&score), "{a} / {b} scored {score}");
        }
    }

    #[test]
    fn test_scorer_reports_every_pattern() {
        let corpus = IntentCorpus::new(vec![
            Intent::new("greeting", &["hello", "hi"], &["Hi there!"]),
            Intent::new("empty", &[], &["unused"]),
            Intent::new("help", &["bantuan", "help"], &["Here is help"]),
        ])
        .unwrap();
        let normalizer = normalizer();
        let scorer = LexicalScorer::new(&corpus, &normalizer).unwrap();
        assert_eq!(scorer.pattern_count(), 4);

        let input = normalizer.normalize("hello").unwrap();
        let Scores::Patterns(scores) = scorer.score(&input).unwrap() else {
            panic!("expected per-pattern scores");
        };
        assert_eq!(scores.len(), 4);
        assert_eq!(scores[0].score, 1.0);
        assert_eq!((scores[3].intent, scores[3].pattern), (2, 1));
    }
}
