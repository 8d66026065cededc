//! Mini-batch SGD training for [`FeedForwardNetwork`].

use ndarray::Dimension;
use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::{NormalizerConfig, TextNormalizer};
use crate::corpus::IntentCorpus;
use crate::error::{IntentError, Result};
use crate::features::Vocabulary;

use super::artifact::TrainedModel;
use super::network::{FeedForwardNetwork, softmax_rows};

const LOG_EPSILON: f32 = 1e-7;

/// Hyperparameters for [`ModelTrainer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Width of each hidden ReLU layer.
    pub hidden_layers: Vec<usize>,
    /// Probability of dropping a hidden activation during training.
    pub dropout: f32,
    pub learning_rate: f32,
    pub momentum: f32,
    pub nesterov: bool,
    pub epochs: usize,
    pub batch_size: usize,
    /// Seed for weight initialization, shuffling and dropout. `None` draws
    /// from OS entropy.
    pub seed: Option<u64>,
    /// Probabilities at or below this value are ignored at inference.
    pub classification_floor: f64,
    /// Emit a progress event every this many epochs; 0 disables.
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            hidden_layers: vec![128, 64],
            dropout: 0.5,
            learning_rate: 0.01,
            momentum: 0.9,
            nesterov: true,
            epochs: 200,
            batch_size: 5,
            seed: None,
            classification_floor: 0.25,
            log_every: 20,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hidden_layers.contains(&0) {
            return Err(IntentError::invalid_config("hidden layer sizes must be positive"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(IntentError::invalid_config(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(IntentError::invalid_config("learning rate must be positive"));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(IntentError::invalid_config("momentum must be in [0, 1)"));
        }
        if self.epochs == 0 {
            return Err(IntentError::invalid_config("epochs must be positive"));
        }
        if self.batch_size == 0 {
            return Err(IntentError::invalid_config("batch size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.classification_floor) {
            return Err(IntentError::invalid_config(
                "classification floor must be in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Per-epoch training metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Mean categorical cross-entropy.
    pub loss: Vec<f32>,
    /// Fraction of patterns whose argmax matched the target.
    pub accuracy: Vec<f32>,
}

impl TrainingHistory {
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    pub fn final_loss(&self) -> Option<f32> {
        self.loss.last().copied()
    }

    pub fn final_accuracy(&self) -> Option<f32> {
        self.accuracy.last().copied()
    }

    fn record(&mut self, loss: f32, accuracy: f32) {
        self.loss.push(loss);
        self.accuracy.push(accuracy);
    }
}

/// Feature matrix and one-hot targets built from a corpus.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub vocabulary: Vocabulary,
    /// Sorted tags of every intent that has at least one pattern.
    pub labels: Vec<String>,
    /// Bag-of-words rows, shape (patterns, vocabulary).
    pub inputs: Array2<f32>,
    /// One-hot rows, shape (patterns, labels).
    pub targets: Array2<f32>,
}

impl TrainingSet {
    pub fn build(corpus: &IntentCorpus, normalizer: &TextNormalizer) -> Result<Self> {
        let mut documents = Vec::with_capacity(corpus.pattern_count());
        for intent in corpus {
            for pattern in &intent.patterns {
                documents.push((intent.tag.as_str(), normalizer.normalize(pattern)?));
            }
        }
        if documents.is_empty() {
            return Err(IntentError::training("corpus has no patterns to train on"));
        }

        let vocabulary = Vocabulary::build(
            documents
                .iter()
                .flat_map(|(_, doc)| doc.terms().iter().map(String::as_str)),
        );
        if vocabulary.is_empty() {
            return Err(IntentError::training("patterns produced an empty vocabulary"));
        }

        let mut labels: Vec<String> = documents.iter().map(|(tag, _)| tag.to_string()).collect();
        labels.sort();
        labels.dedup();

        let mut inputs = Array2::zeros((documents.len(), vocabulary.len()));
        let mut targets = Array2::zeros((documents.len(), labels.len()));
        for (row, (tag, doc)) in documents.iter().enumerate() {
            inputs
                .row_mut(row)
                .assign(&vocabulary.bag_of_words(doc.terms()));
            if let Ok(label) = labels.binary_search_by(|label| label.as_str().cmp(*tag)) {
                targets[[row, label]] = 1.0;
            }
        }

        Ok(TrainingSet {
            vocabulary,
            labels,
            inputs,
            targets,
        })
    }

    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct Velocity {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

/// Builds features from a corpus and fits a classifier to them.
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: TrainingConfig,
    normalizer: NormalizerConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        ModelTrainer {
            config,
            normalizer: NormalizerConfig::default(),
        }
    }

    /// Normalizer settings used for features and persisted with the model.
    pub fn with_normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn normalizer(&self) -> NormalizerConfig {
        self.normalizer
    }

    /// Train a classifier over every pattern of the corpus.
    pub fn train(&self, corpus: &IntentCorpus) -> Result<TrainedModel> {
        self.config.validate()?;

        let normalizer = TextNormalizer::new(self.normalizer)?;
        let set = TrainingSet::build(corpus, &normalizer)?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut sizes = Vec::with_capacity(self.config.hidden_layers.len() + 2);
        sizes.push(set.vocabulary.len());
        sizes.extend_from_slice(&self.config.hidden_layers);
        sizes.push(set.labels.len());

        let mut network = FeedForwardNetwork::glorot(&sizes, &mut rng)?;
        info!(
            patterns = set.len(),
            vocabulary = set.vocabulary.len(),
            labels = set.labels.len(),
            parameters = network.parameter_count(),
            epochs = self.config.epochs,
            "training classifier"
        );

        let history = self.fit(&mut network, &set, &mut rng)?;

        TrainedModel::new(network, set.vocabulary, set.labels, self.normalizer)
            .map(|model| model.with_history(history))
    }

    fn fit(
        &self,
        network: &mut FeedForwardNetwork,
        set: &TrainingSet,
        rng: &mut StdRng,
    ) -> Result<TrainingHistory> {
        let mut velocities: Vec<Velocity> = network
            .layers()
            .iter()
            .map(|layer| Velocity {
                weights: Array2::zeros(layer.weights.raw_dim()),
                bias: Array1::zeros(layer.bias.raw_dim()),
            })
            .collect();

        let mut order: Vec<usize> = (0..set.len()).collect();
        let mut history = TrainingHistory::default();

        for epoch in 1..=self.config.epochs {
            order.shuffle(rng);

            let mut loss_sum = 0.0;
            let mut correct = 0;
            for batch in order.chunks(self.config.batch_size) {
                let inputs = set.inputs.select(Axis(0), batch);
                let targets = set.targets.select(Axis(0), batch);

                let (loss, probabilities) =
                    self.train_batch(network, &mut velocities, &inputs, &targets, rng);
                loss_sum += loss * batch.len() as f32;
                correct += count_correct(&probabilities, &targets);
            }

            let loss = loss_sum / set.len() as f32;
            let accuracy = correct as f32 / set.len() as f32;
            if !loss.is_finite() {
                return Err(IntentError::training(format!("loss diverged at epoch {epoch}")));
            }
            history.record(loss, accuracy);

            if self.config.log_every > 0
                && (epoch % self.config.log_every == 0 || epoch == self.config.epochs)
            {
                info!(epoch, loss, accuracy, "training progress");
            } else {
                debug!(epoch, loss, accuracy, "epoch finished");
            }
        }

        Ok(history)
    }

    /// One forward and backward pass; returns the batch loss and the
    /// predicted probabilities.
    fn train_batch(
        &self,
        network: &mut FeedForwardNetwork,
        velocities: &mut [Velocity],
        inputs: &Array2<f32>,
        targets: &Array2<f32>,
        rng: &mut StdRng,
    ) -> (f32, Array2<f32>) {
        let batch_size = inputs.nrows() as f32;
        let keep = 1.0 - self.config.dropout;

        // activations[i] is the input of layer i; masks[i] is the gradient
        // gate of hidden layer i (ReLU derivative times the dropout mask).
        let mut activations = vec![inputs.clone()];
        let mut masks = Vec::new();
        let mut probabilities = Array2::zeros((0, 0));

        let layers = network.layers();
        let last = layers.len() - 1;
        for (index, layer) in layers.iter().enumerate() {
            let mut z = layer.forward(&activations[index].view());
            if index < last {
                let mask = z.mapv(|v| {
                    if v <= 0.0 {
                        0.0
                    } else if keep < 1.0 {
                        if rng.random::<f32>() < keep { 1.0 / keep } else { 0.0 }
                    } else {
                        1.0
                    }
                });
                activations.push(&z * &mask);
                masks.push(mask);
            } else {
                softmax_rows(&mut z);
                probabilities = z;
            }
        }

        let loss = -(probabilities.mapv(|p| p.max(LOG_EPSILON).ln()) * targets).sum() / batch_size;

        let mut delta = (&probabilities - targets) / batch_size;
        let layers = network.layers_mut();
        for index in (0..layers.len()).rev() {
            let grad_weights = activations[index].t().dot(&delta);
            let grad_bias = delta.sum_axis(Axis(0));

            let next = (index > 0).then(|| delta.dot(&layers[index].weights.t()) * &masks[index - 1]);

            let velocity = &mut velocities[index];
            self.step(&mut layers[index].weights, &mut velocity.weights, &grad_weights);
            self.step(&mut layers[index].bias, &mut velocity.bias, &grad_bias);

            if let Some(next) = next {
                delta = next;
            }
        }

        (loss, probabilities)
    }

    /// SGD with momentum: `v = m*v - lr*g`, then `w += v`, or with Nesterov
    /// `w += m*v - lr*g`.
    fn step<D: Dimension>(
        &self,
        param: &mut Array<f32, D>,
        velocity: &mut Array<f32, D>,
        grad: &Array<f32, D>,
    ) {
        let lr = self.config.learning_rate;
        let momentum = self.config.momentum;

        *velocity *= momentum;
        velocity.scaled_add(-lr, grad);

        if self.config.nesterov {
            param.scaled_add(momentum, velocity);
            param.scaled_add(-lr, grad);
        } else {
            *param += &*velocity;
        }
    }
}

fn argmax(row: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (index, &value) in row.iter().enumerate() {
        if value > row[best] {
            best = index;
        }
    }
    best
}

fn count_correct(probabilities: &Array2<f32>, targets: &Array2<f32>) -> usize {
    probabilities
        .rows()
        .into_iter()
        .zip(targets.rows())
        .filter(|(predicted, target)| argmax(predicted.view()) == argmax(target.view()))
        .count()
}
