//! Trainable feed-forward intent classifier.
//!
//! [`ModelTrainer`] turns a corpus into bag-of-words features and fits a
//! [`FeedForwardNetwork`] to them. The result is a [`TrainedModel`], which is
//! persisted and reloaded as one directory unit and served through a
//! [`ModelSlot`] that can be retrained while queries continue.

pub mod artifact;
pub mod network;
pub mod slot;
pub mod trainer;

pub use artifact::{
    CLASSIFIER_FILE, FORMAT_VERSION, LABELS_FILE, MANIFEST_FILE, Manifest, TrainedModel,
    VOCABULARY_FILE,
};
pub use network::{DenseLayer, FeedForwardNetwork};
pub use slot::ModelSlot;
pub use trainer::{ModelTrainer, TrainingConfig, TrainingHistory, TrainingSet};
