//! Reduces strategy scores to a single intent and applies the threshold.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::analysis::TextNormalizer;
use crate::corpus::{Intent, IntentCorpus};
use crate::error::Result;
use crate::scoring::IntentScorer;

/// How a resolution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The best score reached the threshold.
    Matched,
    /// Nothing scored high enough.
    BelowThreshold,
    /// Nothing scored high enough but a pattern is spelled closely enough.
    /// Only produced by [`IntentEngine`](crate::engine::IntentEngine).
    CloseMatch,
    /// The input held no resolvable tokens.
    EmptyInput,
}

/// Result of resolving one utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionResult<'a> {
    pub intent: Option<&'a Intent>,
    pub confidence: f64,
    pub outcome: Outcome,
}

impl<'a> ResolutionResult<'a> {
    fn unmatched(outcome: Outcome) -> Self {
        ResolutionResult {
            intent: None,
            confidence: 0.0,
            outcome,
        }
    }

    pub fn is_match(&self) -> bool {
        self.outcome == Outcome::Matched
    }
}

/// Normalizes input, scores it and picks the winning intent.
#[derive(Debug)]
pub struct IntentResolver {
    corpus: Arc<IntentCorpus>,
    normalizer: Arc<TextNormalizer>,
    scorer: Box<dyn IntentScorer>,
}

impl IntentResolver {
    pub fn new(
        corpus: Arc<IntentCorpus>,
        normalizer: Arc<TextNormalizer>,
        scorer: Box<dyn IntentScorer>,
    ) -> Self {
        IntentResolver {
            corpus,
            normalizer,
            scorer,
        }
    }

    pub fn corpus(&self) -> &IntentCorpus {
        &self.corpus
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn scorer(&self) -> &dyn IntentScorer {
        self.scorer.as_ref()
    }

    /// The active strategy's documented threshold.
    pub fn default_threshold(&self) -> f64 {
        self.scorer.default_threshold()
    }

    /// Resolve `raw` against the corpus.
    ///
    /// Candidates are visited in the scorer's order and a later one replaces
    /// the best only with a strictly greater score, so the earliest wins ties.
    /// A score of zero never matches. The best candidate is accepted when its
    /// score is at least `threshold`.
    pub fn resolve(&self, raw: &str, threshold: f64) -> Result<ResolutionResult<'_>> {
        let normalized = self.normalizer.normalize(raw)?;
        if normalized.is_empty() {
            debug!("input has no resolvable tokens");
            return Ok(ResolutionResult::unmatched(Outcome::EmptyInput));
        }

        let scores = self.scorer.score(&normalized)?;

        let mut best: Option<usize> = None;
        let mut best_score = 0.0;
        for (intent, score) in scores.candidates() {
            if score > best_score {
                best = Some(intent);
                best_score = score;
            }
        }

        let intent = best.and_then(|index| self.corpus.intents().get(index));
        debug!(
            input = normalized.text(),
            strategy = self.scorer.name(),
            candidates = scores.len(),
            best = intent.map(|i| i.tag.as_str()),
            score = best_score,
            threshold,
            "scored input"
        );

        match intent {
            Some(intent) if best_score >= threshold => Ok(ResolutionResult {
                intent: Some(intent),
                confidence: best_score,
                outcome: Outcome::Matched,
            }),
            _ => Ok(ResolutionResult::unmatched(Outcome::BelowThreshold)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{NormalizedText, NormalizerConfig};
    use crate::scoring::{IntentScore, LexicalScorer, PatternScore, Scores};

    fn corpus() -> Arc<IntentCorpus> {
        Arc::new(
            IntentCorpus::new(vec![
                Intent::new("greeting", &["hello", "hi"], &["Hi there!"]),
                Intent::new("help", &["bantuan", "help"], &["Here is help"]),
            ])
            .unwrap(),
        )
    }

    fn lexical_resolver() -> IntentResolver {
        let corpus = corpus();
        let normalizer = Arc::new(TextNormalizer::new(NormalizerConfig::default()).unwrap());
        let scorer = LexicalScorer::new(&corpus, &normalizer).unwrap();
        IntentResolver::new(corpus, normalizer, Box::new(scorer))
    }

    /// Returns fixed scores regardless of input.
    #[derive(Debug)]
    struct FixedScorer(Scores);

    impl IntentScorer for FixedScorer {
        fn score(&self, _input: &NormalizedText) -> Result<Scores> {
            Ok(self.0.clone())
        }

        fn default_threshold(&self) -> f64 {
            0.5
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn fixed_resolver(scores: Scores) -> IntentResolver {
        let normalizer = Arc::new(TextNormalizer::new(NormalizerConfig::default()).unwrap());
        IntentResolver::new(corpus(), normalizer, Box::new(FixedScorer(scores)))
    }

    #[test]
    fn test_exact_match() {
        let resolver = lexical_resolver();
        let result = resolver.resolve("Hello", 0.3).unwrap();
        assert_eq!(result.outcome, Outcome::Matched);
        assert_eq!(result.intent.unwrap().tag, "greeting");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_empty_input() {
        let resolver = lexical_resolver();
        for raw in ["", "   ", "?!"] {
            let result = resolver.resolve(raw, 0.0).unwrap();
            assert_eq!(result.outcome, Outcome::EmptyInput);
            assert!(result.intent.is_none());
            assert_eq!(result.confidence, 0.0);
        }
    }

    #[test]
    fn test_below_threshold_reports_zero() {
        let resolver = lexical_resolver();
        let result = resolver.resolve("help me please", 0.9).unwrap();
        assert_eq!(result.outcome, Outcome::BelowThreshold);
        assert!(result.intent.is_none());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_zero_score_never_matches() {
        let resolver = lexical_resolver();
        let result = resolver.resolve("xyzzy", 0.0).unwrap();
        assert_eq!(result.outcome, Outcome::BelowThreshold);
    }

    #[test]
    fn test_first_pattern_wins_ties() {
        let resolver = fixed_resolver(Scores::Patterns(vec![
            PatternScore { intent: 1, pattern: 0, score: 0.6 },
            PatternScore { intent: 0, pattern: 1, score: 0.6 },
        ]));
        let result = resolver.resolve("anything", 0.3).unwrap();
        assert_eq!(result.intent.unwrap().tag, "help");
    }

    #[test]
    fn test_distribution_gate_is_inclusive() {
        let resolver = fixed_resolver(Scores::Distribution(vec![
            IntentScore { intent: 0, score: 0.5 },
            IntentScore { intent: 1, score: 0.3 },
        ]));
        let result = resolver.resolve("anything", resolver.default_threshold()).unwrap();
        assert_eq!(result.outcome, Outcome::Matched);
        assert_eq!(result.intent.unwrap().tag, "greeting");
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_empty_distribution_is_below_threshold() {
        let resolver = fixed_resolver(Scores::Distribution(Vec::new()));
        let result = resolver.resolve("anything", 0.0).unwrap();
        assert_eq!(result.outcome, Outcome::BelowThreshold);
    }

    #[test]
    fn test_raising_threshold_only_rejects_more() {
        let resolver = lexical_resolver();
        let inputs = ["hello", "help me please", "hi hello", "bantuan dong", "xyzzy"];
        let thresholds = [0.0, 0.1, 0.3, 0.5, 0.7, 0.9, 1.0];

        for input in inputs {
            let mut rejected = false;
            for threshold in thresholds {
                let matched = resolver.resolve(input, threshold).unwrap().is_match();
                assert!(!(rejected && matched), "{input} re-matched at {threshold}");
                rejected |= !matched;
            }
        }
    }
}
