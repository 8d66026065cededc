//! Neural scorer: one forward pass of the active trained model.

use std::sync::Arc;

use tracing::debug;

use crate::analysis::NormalizedText;
use crate::corpus::IntentCorpus;
use crate::error::Result;
use crate::neural::ModelSlot;

use super::{IntentScore, IntentScorer, NEURAL_THRESHOLD, Scores};

/// Default probability at or below which a label is ignored.
pub const CLASSIFICATION_FLOOR: f64 = 0.25;

/// Scores intents with the model currently held by a [`ModelSlot`].
///
/// Every query reads the slot once, so a retrain that completes mid-query
/// affects only later queries. Labels the corpus does not know are skipped.
#[derive(Debug, Clone)]
pub struct NeuralScorer {
    corpus: Arc<IntentCorpus>,
    slot: Arc<ModelSlot>,
    floor: f64,
}

impl NeuralScorer {
    pub fn new(corpus: Arc<IntentCorpus>, slot: Arc<ModelSlot>) -> Self {
        NeuralScorer {
            corpus,
            slot,
            floor: CLASSIFICATION_FLOOR,
        }
    }

    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub fn slot(&self) -> &Arc<ModelSlot> {
        &self.slot
    }
}

impl IntentScorer for NeuralScorer {
    fn score(&self, input: &NormalizedText) -> Result<Scores> {
        let model = self.slot.current();
        let candidates = model.classify(input.terms(), self.floor)?;

        let mut scores = Vec::with_capacity(candidates.len());
        for (label, probability) in candidates {
            let tag = &model.labels()[label];
            match self.corpus.position(tag) {
                Some(intent) => scores.push(IntentScore {
                    intent,
                    score: probability,
                }),
                None => debug!(%tag, "model label not present in corpus"),
            }
        }

        Ok(Scores::Distribution(scores))
    }

    fn default_threshold(&self) -> f64 {
        NEURAL_THRESHOLD
    }

    fn name(&self) -> &str {
        "neural"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{NormalizerConfig, TextNormalizer};
    use crate::corpus::Intent;
    use crate::neural::{ModelTrainer, TrainingConfig};

    #[test]
    fn test_scores_map_labels_to_corpus_positions() {
        let corpus = Arc::new(
            IntentCorpus::new(vec![
                Intent::new("vibration", &["analisis getaran", "vibration analysis"], &["V"]),
                Intent::new("dga", &["apa itu dga", "gas terlarut"], &["D"]),
            ])
            .unwrap(),
        );
        let model = ModelTrainer::new(TrainingConfig {
            hidden_layers: vec![16],
            epochs: 200,
            dropout: 0.0,
            seed: Some(5),
            log_every: 0,
            ..Default::default()
        })
        .train(&corpus)
        .unwrap();
        // labels are sorted, the corpus is not
        assert_eq!(model.labels(), ["dga", "vibration"]);

        let scorer = NeuralScorer::new(Arc::clone(&corpus), Arc::new(ModelSlot::new(model)))
            .with_floor(0.0);
        let normalizer = TextNormalizer::new(NormalizerConfig::default()).unwrap();

        let scores = scorer.score(&normalizer.normalize("apa itu dga").unwrap()).unwrap();
        let Scores::Distribution(distribution) = scores else {
            panic!("expected a distribution");
        };
        assert_eq!(distribution.len(), 2);
        assert_eq!(distribution[0].intent, 1);
        assert_eq!(distribution[1].intent, 0);
        assert!(distribution[0].score > distribution[1].score);

        let total: f64 = distribution.iter().map(|s| s.score).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }
}
