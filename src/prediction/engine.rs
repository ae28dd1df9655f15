//! Batch prediction over the fixed descriptor set
//!
//! Every descriptor is evaluated independently against the same dataset. A
//! descriptor that fails to train or infer is answered by the jittered formula
//! and placeholder metrics, and its outcome is tagged as a fallback.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{debug, info, warn};
use uuid::Uuid;

use ndarray::{Array1, Array2};

use crate::domain::{feature_matrix, Dataset, FEATURE_COUNT};
use crate::ml::{DenseNetwork, MinMaxScaler, ModelStore, ModelTrainer, TrainingConfig, TrainingDataset, TrainingError};

use super::descriptors::{ModelDescriptor, DESCRIPTORS, NEURAL_NETWORK};
use super::dust::dust_impact;
use super::formula;
use super::importance::{feature_importance, ImportanceMap};
use super::metrics::RegressionMetrics;

/// How predictions are produced for each descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PredictionMode {
    /// Closed-form estimate with per-row jitter
    Formula,
    /// Dense regressor trained on the dataset
    #[default]
    Regressor,
}

/// Per-call overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictOptions {
    pub mode: Option<PredictionMode>,
    /// Train the regressor before predicting
    pub train: bool,
    /// Seed for jitter, placeholders and weight initialisation
    pub seed: Option<u64>,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            mode: None,
            train: true,
            seed: None,
        }
    }
}

/// Where an outcome's predictions came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Provenance {
    Model,
    Formula,
    Fallback { reason: String },
}

impl Provenance {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Provenance::Fallback { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOutcome {
    pub name: String,
    pub color: String,
    /// One prediction per input row, same order
    pub predictions: Vec<f64>,
    pub metrics: RegressionMetrics,
    pub importance: ImportanceMap,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub mode: PredictionMode,
    /// Name of the first descriptor
    pub default_model: String,
    /// The first descriptor's outcome, surfaced on its own
    pub default_result: ModelOutcome,
    pub outcomes: Vec<ModelOutcome>,
    /// Percent of output lost to particulates
    pub dust_impact: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_power: Option<Vec<Option<f64>>>,
}

impl PredictionReport {
    pub fn outcome(&self, name: &str) -> Option<&ModelOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub mode: PredictionMode,
    pub training: TrainingConfig,
    pub random_seed: Option<u64>,
}

/// Inputs shared by every descriptor in one call
struct Prepared<'a> {
    dataset: &'a Dataset,
    scaler: MinMaxScaler,
    scaled: Array2<f64>,
    labels: Array1<f64>,
    observed: Vec<Option<f64>>,
}

impl<'a> Prepared<'a> {
    fn new(dataset: &'a Dataset) -> Self {
        let features = feature_matrix(dataset);
        let scaler = MinMaxScaler::fit(&features);
        let scaled = scaler.transform(&features);
        let labels: Array1<f64> = dataset.readings().iter().map(formula::label).collect();

        Self {
            dataset,
            scaler,
            scaled,
            labels,
            observed: dataset.actual_power(),
        }
    }

    fn metrics(&self, predictions: &[f64], rng: &mut StdRng) -> RegressionMetrics {
        if !self.dataset.has_actual_power() {
            return RegressionMetrics::placeholder(rng);
        }
        RegressionMetrics::against_observed(&self.observed, predictions)
            .unwrap_or_else(|_| RegressionMetrics::placeholder(rng))
    }
}

pub struct PredictionEngine {
    config: EngineConfig,
    store: Arc<ModelStore>,
    trainer: ModelTrainer,
}

impl PredictionEngine {
    pub fn new(config: EngineConfig, store: Arc<ModelStore>) -> Self {
        let trainer = ModelTrainer::new(config.training.clone());
        Self { config, store, trainer }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    /// Run every descriptor over `dataset`. Never fails: per-descriptor errors
    /// become fallback outcomes.
    pub fn predict(&self, dataset: &Dataset, options: &PredictOptions) -> PredictionReport {
        let mode = options.mode.unwrap_or(self.config.mode);
        let mut rng = match options.seed.or(self.config.random_seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(rows = dataset.len(), %mode, train = options.train, "running prediction");

        let prepared = Prepared::new(dataset);
        let mut outcomes = Vec::with_capacity(DESCRIPTORS.len());
        let mut neural_net = None;

        for descriptor in &DESCRIPTORS {
            let (outcome, net) = self.run_descriptor(descriptor, &prepared, mode, options.train, &mut rng);
            if descriptor.name == NEURAL_NETWORK {
                neural_net = net;
            }
            outcomes.push(outcome);
        }

        let neural_net = neural_net.or_else(|| {
            self.store
                .get(NEURAL_NETWORK)
                .filter(|n| n.input_dim() == FEATURE_COUNT)
        });
        let dust = dust_impact(dataset, neural_net.as_ref().map(|n| (n, &prepared.scaler)));

        PredictionReport {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            mode,
            default_model: DESCRIPTORS[0].name.to_string(),
            default_result: outcomes[0].clone(),
            outcomes,
            dust_impact: dust,
            actual_power: dataset.has_actual_power().then(|| dataset.actual_power()),
        }
    }

    fn run_descriptor(
        &self,
        descriptor: &ModelDescriptor,
        prepared: &Prepared<'_>,
        mode: PredictionMode,
        train: bool,
        rng: &mut StdRng,
    ) -> (ModelOutcome, Option<DenseNetwork>) {
        let readings = prepared.dataset.readings();

        let (predictions, provenance, net): (Vec<f64>, Provenance, Option<DenseNetwork>) = match mode {
            PredictionMode::Formula => {
                let preds = readings.iter().map(|r| formula::jittered(r, rng)).collect();
                (preds, Provenance::Formula, None)
            }
            PredictionMode::Regressor => match self.regress(descriptor, prepared, train, rng) {
                Ok((preds, net)) => (preds, Provenance::Model, Some(net)),
                Err(e) => {
                    warn!(model = descriptor.name, error = %e, "regressor failed, using formula fallback");
                    let preds = readings.iter().map(|r| formula::jittered(r, rng)).collect();
                    let reason = e.to_string();
                    (preds, Provenance::Fallback { reason }, None)
                }
            },
        };

        let metrics = if provenance.is_fallback() {
            RegressionMetrics::placeholder(rng)
        } else {
            prepared.metrics(&predictions, rng)
        };
        debug!(model = descriptor.name, %metrics, "descriptor evaluated");

        let outcome = ModelOutcome {
            name: descriptor.name.to_string(),
            color: descriptor.color.to_string(),
            predictions,
            metrics,
            importance: feature_importance(descriptor, &prepared.scaler),
            provenance,
        };
        (outcome, net)
    }

    fn regress(
        &self,
        descriptor: &ModelDescriptor,
        prepared: &Prepared<'_>,
        train: bool,
        rng: &mut StdRng,
    ) -> Result<(Vec<f64>, DenseNetwork), TrainingError> {
        let (mut net, hit) = self.store.get_or_create(descriptor.name, &descriptor.layout(), || {
            DenseNetwork::new(FEATURE_COUNT, descriptor.hidden_layers, &mut *rng)
        });
        debug!(model = descriptor.name, ?hit, "regressor ready");

        if train {
            let data = TrainingDataset::new(prepared.scaled.clone(), prepared.labels.clone())?;
            let history = self.trainer.fit(&mut net, &data, rng)?;
            debug!(
                model = descriptor.name,
                loss = history.final_loss().unwrap_or(f64::NAN),
                "regressor trained"
            );
        }

        let predictions = net.predict_batch(prepared.scaled.view())?.to_vec();
        if train {
            self.store.put(descriptor.name, net.clone());
        }
        Ok((predictions, net))
    }
}
