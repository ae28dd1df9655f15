//! Training loop for the dense regressor
//!
//! Mini-batch Adam on mean squared error, a fixed number of epochs per call.

use ndarray::{Array1, Array2, Axis, Zip};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::network::{DenseNetwork, Gradients, NetworkError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error("cannot train on an empty dataset")]
    Empty,

    #[error("feature and target count mismatch: {features} features, {targets} targets")]
    LengthMismatch { features: usize, targets: usize },

    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("training diverged at epoch {epoch}")]
    Diverged { epoch: usize },

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Training Dataset: one sample per feature row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDataset {
    pub features: Array2<f64>,
    pub targets: Array1<f64>,
}

impl TrainingDataset {
    pub fn new(features: Array2<f64>, targets: Array1<f64>) -> Result<Self, TrainingError> {
        if features.nrows() != targets.len() {
            return Err(TrainingError::LengthMismatch {
                features: features.nrows(),
                targets: targets.len(),
            });
        }
        Ok(Self { features, targets })
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Training Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            learning_rate: 0.001,
            batch_size: 32,
        }
    }
}

/// Per-epoch mean training loss
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub losses: Vec<f64>,
}

impl TrainingHistory {
    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}

/// Adam optimiser state for one network
struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    m: Gradients,
    v: Gradients,
}

impl Adam {
    fn new(net: &DenseNetwork, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            m: net.zero_gradients(),
            v: net.zero_gradients(),
        }
    }

    fn apply(&mut self, net: &mut DenseNetwork, grads: &Gradients) {
        self.step += 1;
        let bias1 = 1.0 - self.beta1.powi(self.step);
        let bias2 = 1.0 - self.beta2.powi(self.step);
        let (b1, b2, lr, eps) = (self.beta1, self.beta2, self.learning_rate, self.epsilon);

        let update = |param: &mut f64, g: f64, m: &mut f64, v: &mut f64| {
            *m = b1 * *m + (1.0 - b1) * g;
            *v = b2 * *v + (1.0 - b2) * g * g;
            let m_hat = *m / bias1;
            let v_hat = *v / bias2;
            *param -= lr * m_hat / (v_hat.sqrt() + eps);
        };

        let moments = self.m.iter_mut().zip(self.v.iter_mut());
        for ((layer, g), (m, v)) in net.layers_mut().iter_mut().zip(grads).zip(moments) {
            Zip::from(&mut layer.weights)
                .and(&g.weights)
                .and(&mut m.weights)
                .and(&mut v.weights)
                .for_each(|p, &g, m, v| update(p, g, m, v));
            Zip::from(&mut layer.biases)
                .and(&g.biases)
                .and(&mut m.biases)
                .and(&mut v.biases)
                .for_each(|p, &g, m, v| update(p, g, m, v));
        }
    }
}

/// Model Trainer
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit `net` in place for the configured number of epochs
    pub fn fit<R: Rng>(
        &self,
        net: &mut DenseNetwork,
        dataset: &TrainingDataset,
        rng: &mut R,
    ) -> Result<TrainingHistory, TrainingError> {
        if dataset.is_empty() {
            return Err(TrainingError::Empty);
        }
        if self.config.batch_size == 0 {
            return Err(TrainingError::InvalidConfig("batch_size must be > 0".into()));
        }
        if !(self.config.learning_rate > 0.0 && self.config.learning_rate.is_finite()) {
            return Err(TrainingError::InvalidConfig(
                "learning_rate must be a positive number".into(),
            ));
        }

        let mut adam = Adam::new(net, self.config.learning_rate);
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        let mut history = TrainingHistory::default();

        for epoch in 0..self.config.epochs {
            order.shuffle(rng);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(self.config.batch_size) {
                let scale = 1.0 / batch.len() as f64;
                let mut grads = net.zero_gradients();
                let inputs = dataset.features.select(Axis(0), batch);
                let targets = dataset.targets.select(Axis(0), batch);

                epoch_loss += net.accumulate_gradients(inputs.view(), targets.view(), scale, &mut grads)?;
                adam.apply(net, &grads);
            }

            let mean_loss = epoch_loss / dataset.len() as f64;
            if !mean_loss.is_finite() {
                return Err(TrainingError::Diverged { epoch });
            }
            debug!(epoch, loss = mean_loss, "epoch complete");
            history.losses.push(mean_loss);
        }

        Ok(history)
    }
}
