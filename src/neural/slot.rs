//! Hot-swappable holder of the active model.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::analysis::NormalizerConfig;
use crate::corpus::IntentCorpus;
use crate::error::{IntentError, Result};

use super::artifact::TrainedModel;
use super::trainer::ModelTrainer;

/// Shares one [`TrainedModel`] between readers and replaces it atomically.
///
/// Readers clone the current `Arc` and keep using it even if a swap happens
/// meanwhile. Writers serialize on an internal mutex, so at most one training
/// run is in flight per slot.
#[derive(Debug)]
pub struct ModelSlot {
    current: RwLock<Arc<TrainedModel>>,
    training: Mutex<()>,
}

impl ModelSlot {
    pub fn new(model: TrainedModel) -> Self {
        ModelSlot {
            current: RwLock::new(Arc::new(model)),
            training: Mutex::new(()),
        }
    }

    /// The model in effect now.
    pub fn current(&self) -> Arc<TrainedModel> {
        self.current.read().clone()
    }

    /// Normalizer settings every model in this slot must share.
    pub fn normalizer(&self) -> NormalizerConfig {
        self.current.read().normalizer()
    }

    /// Install `model`, returning the one it replaced.
    pub fn replace(&self, model: TrainedModel) -> Result<Arc<TrainedModel>> {
        let _guard = self.training.lock();
        self.swap(model)
    }

    /// Train a new model on `corpus` and install it.
    ///
    /// The slot keeps serving the previous model until training completes.
    /// On error the previous model stays in place.
    pub fn retrain(&self, trainer: &ModelTrainer, corpus: &IntentCorpus) -> Result<Arc<TrainedModel>> {
        let _guard = self.training.lock();
        self.check_normalizer(trainer.normalizer())?;

        let model = trainer.train(corpus)?;
        self.swap(model)?;
        Ok(self.current())
    }

    fn check_normalizer(&self, candidate: NormalizerConfig) -> Result<()> {
        let expected = self.normalizer();
        if candidate != expected {
            return Err(IntentError::incompatible(format!(
                "model normalizer {candidate:?} differs from slot normalizer {expected:?}"
            )));
        }
        Ok(())
    }

    fn swap(&self, model: TrainedModel) -> Result<Arc<TrainedModel>> {
        self.check_normalizer(model.normalizer())?;

        let model = Arc::new(model);
        let previous = std::mem::replace(&mut *self.current.write(), model);
        info!(labels = self.current.read().labels().len(), "swapped active model");
        Ok(previous)
    }
}
