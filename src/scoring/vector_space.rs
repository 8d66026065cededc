//! Vector-space scorer: TF-IDF cosine similarity against every pattern.

use tracing::debug;

use crate::analysis::{NormalizedText, TextNormalizer};
use crate::corpus::IntentCorpus;
use crate::error::Result;

use super::tfidf::{TfIdfVectorizer, cosine_similarity};
use super::{IntentScorer, PatternScore, Scores, VECTOR_SPACE_THRESHOLD};

/// Cosine similarity of TF-IDF vectors.
///
/// The vectorizer is fitted once over all patterns when the scorer is built;
/// queries reuse its vocabulary and IDF weights.
#[derive(Debug, Clone)]
pub struct VectorSpaceScorer {
    vectorizer: TfIdfVectorizer,
    /// (intent index, pattern index, feature vector)
    prototypes: Vec<(usize, usize, Vec<f64>)>,
}

impl VectorSpaceScorer {
    pub fn new(corpus: &IntentCorpus, normalizer: &TextNormalizer) -> Result<Self> {
        let mut keys = Vec::with_capacity(corpus.pattern_count());
        let mut documents = Vec::with_capacity(corpus.pattern_count());
        for (intent_index, intent) in corpus.iter().enumerate() {
            for (pattern_index, pattern) in intent.patterns.iter().enumerate() {
                keys.push((intent_index, pattern_index));
                documents.push(normalizer.normalize(pattern)?);
            }
        }

        let terms: Vec<&[String]> = documents.iter().map(NormalizedText::terms).collect();
        let vectorizer = TfIdfVectorizer::fit(&terms);

        let prototypes = keys
            .into_iter()
            .zip(&documents)
            .map(|((intent, pattern), doc)| (intent, pattern, vectorizer.transform(doc.terms())))
            .collect();

        debug!(
            patterns = documents.len(),
            vocabulary = vectorizer.vocabulary_size(),
            "fitted vector-space scorer"
        );
        Ok(VectorSpaceScorer {
            vectorizer,
            prototypes,
        })
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }
}

impl IntentScorer for VectorSpaceScorer {
    fn score(&self, input: &NormalizedText) -> Result<Scores> {
        let query = self.vectorizer.transform(input.terms());
        let scores = self
            .prototypes
            .iter()
            .map(|(intent, pattern, prototype)| PatternScore {
                intent: *intent,
                pattern: *pattern,
                score: cosine_similarity(&query, prototype),
            })
            .collect();
        Ok(Scores::Patterns(scores))
    }

    fn default_threshold(&self) -> f64 {
        VECTOR_SPACE_THRESHOLD
    }

    fn name(&self) -> &str {
        "vector_space"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::NormalizerConfig;
    use crate::corpus::Intent;

    fn fixture() -> (IntentCorpus, TextNormalizer) {
        let corpus = IntentCorpus::new(vec![
            Intent::new("dga", &["apa itu dga", "analisis gas terlarut"], &["DGA."]),
            Intent::new("mcsa", &["apa itu mcsa", "analisis arus motor"], &["MCSA."]),
        ])
        .unwrap();
        let normalizer = TextNormalizer::new(NormalizerConfig::default()).unwrap();
        (corpus, normalizer)
    }

    fn best(scores: &Scores) -> (usize, f64) {
        scores
            .candidates()
            .fold((usize::MAX, -1.0), |best, c| if c.1 > best.1 { c } else { best })
    }

    #[test]
    fn test_exact_pattern_scores_one() {
        let (corpus, normalizer) = fixture();
        let scorer = VectorSpaceScorer::new(&corpus, &normalizer).unwrap();

        let scores = scorer.score(&normalizer.normalize("Apa itu MCSA?").unwrap()).unwrap();
        let (intent, score) = best(&scores);
        assert_eq!(intent, 1);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_vocabulary_scores_zero() {
        let (corpus, normalizer) = fixture();
        let scorer = VectorSpaceScorer::new(&corpus, &normalizer).unwrap();

        let scores = scorer.score(&normalizer.normalize("xyzzy plugh").unwrap()).unwrap();
        assert_eq!(scores.len(), 4);
        assert!(scores.candidates().all(|(_, score)| score == 0.0));
    }

    #[test]
    fn test_partial_overlap_in_unit_interval() {
        let (corpus, normalizer) = fixture();
        let scorer = VectorSpaceScorer::new(&corpus, &normalizer).unwrap();

        let scores = scorer
            .score(&normalizer.normalize("gas apa yang terlarut").unwrap())
            .unwrap();
        let (intent, score) = best(&scores);
        assert_eq!(intent, 0);
        assert!(score > 0.0 && score < 1.0);
    }
}
