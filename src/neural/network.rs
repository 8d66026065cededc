//! Feed-forward classifier: ReLU hidden layers and a softmax output.

use ndarray::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{IntentError, Result};

/// Fully connected layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    /// matrix with shape (i, o)
    /// ------------------------
    ///
    /// - i = number of inputs
    /// - o = number of outputs
    pub weights: Array2<f32>,
    /// vector with shape (o)
    pub bias: Array1<f32>,
}

impl DenseLayer {
    pub fn new(weights: Array2<f32>, bias: Array1<f32>) -> Result<Self> {
        if weights.ncols() != bias.len() {
            return Err(IntentError::incompatible(format!(
                "layer has {} outputs but {} biases",
                weights.ncols(),
                bias.len()
            )));
        }
        Ok(DenseLayer { weights, bias })
    }

    /// Glorot-uniform weights and zero biases.
    pub fn glorot<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f32).sqrt();
        let weights = Array2::from_shape_fn((inputs, outputs), |_| rng.random_range(-limit..=limit));
        DenseLayer {
            weights,
            bias: Array1::zeros(outputs),
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn outputs(&self) -> usize {
        self.weights.ncols()
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    /// Affine transform of a batch with shape (b, i).
    pub fn forward(&self, input: &ArrayView2<f32>) -> Array2<f32> {
        input.dot(&self.weights) + &self.bias
    }
}

/// Stack of dense layers; every layer but the last is followed by ReLU, the
/// last by softmax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedForwardNetwork {
    layers: Vec<DenseLayer>,
}

impl FeedForwardNetwork {
    /// Assemble a network, checking that consecutive layers connect.
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(IntentError::incompatible("network has no layers"));
        }
        for (index, pair) in layers.windows(2).enumerate() {
            if pair[0].outputs() != pair[1].inputs() {
                return Err(IntentError::incompatible(format!(
                    "layer {} emits {} values but layer {} expects {}",
                    index,
                    pair[0].outputs(),
                    index + 1,
                    pair[1].inputs()
                )));
            }
        }
        for layer in &layers {
            if layer.weights.ncols() != layer.bias.len() {
                return Err(IntentError::incompatible("bias width does not match layer"));
            }
        }
        Ok(FeedForwardNetwork { layers })
    }

    /// Randomly initialized network with the given layer widths.
    ///
    /// `sizes` lists input width, hidden widths and output width in order.
    pub fn glorot<R: Rng>(sizes: &[usize], rng: &mut R) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(IntentError::training("network needs an input and an output width"));
        }
        if sizes.contains(&0) {
            return Err(IntentError::training(format!(
                "layer widths must be positive: {sizes:?}"
            )));
        }
        let layers = sizes
            .windows(2)
            .map(|pair| DenseLayer::glorot(pair[0], pair[1], rng))
            .collect();
        Self::new(layers)
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::inputs)
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::outputs)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(DenseLayer::parameter_count).sum()
    }

    /// Class probabilities for a batch with shape (b, input_dim).
    pub fn predict_batch(&self, input: &ArrayView2<f32>) -> Result<Array2<f32>> {
        if input.ncols() != self.input_dim() {
            return Err(IntentError::incompatible(format!(
                "expected {} features, got {}",
                self.input_dim(),
                input.ncols()
            )));
        }

        let last = self.layers.len() - 1;
        let mut activation = input.to_owned();
        for (index, layer) in self.layers.iter().enumerate() {
            activation = layer.forward(&activation.view());
            if index < last {
                activation.mapv_inplace(relu);
            }
        }
        softmax_rows(&mut activation);
        Ok(activation)
    }

    /// Class probabilities for a single feature vector.
    pub fn predict(&self, input: &ArrayView1<f32>) -> Result<Array1<f32>> {
        let batch = input.view().insert_axis(Axis(0));
        let probabilities = self.predict_batch(&batch)?;
        Ok(probabilities.row(0).to_owned())
    }
}

pub(crate) fn relu(x: f32) -> f32 {
    x.max(0.0)
}

/// Numerically stable in-place softmax over each row.
pub(crate) fn softmax_rows(logits: &mut Array2<f32>) {
    for mut row in logits.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
        row.mapv_inplace(|x| (x - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row /= sum;
        }
    }
}
