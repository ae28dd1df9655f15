//! Machine Learning Module
//!
//! Small regression tooling behind the multi-model predictor:
//! - Min-max feature scaling
//! - Dense feed-forward network
//! - Mini-batch Adam training
//! - Opportunistic model cache with best-effort snapshots

use itertools::{Itertools, MinMaxResult};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

pub mod network;
pub mod store;
pub mod training;

pub use network::{DenseNetwork, NetworkError};
pub use store::{CacheHit, ModelStore};
pub use training::{ModelTrainer, TrainingConfig, TrainingDataset, TrainingError, TrainingHistory};

/// Per-column min-max scaler fitted on one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: Vec<f64>,
    maxs: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit per column on a `(samples, features)` matrix
    pub fn fit(features: &Array2<f64>) -> Self {
        let (mins, maxs): (Vec<f64>, Vec<f64>) = features
            .axis_iter(Axis(1))
            .map(|col| match col.iter().copied().minmax_by(f64::total_cmp) {
                MinMaxResult::NoElements => (0.0, 0.0),
                MinMaxResult::OneElement(v) => (v, v),
                MinMaxResult::MinMax(lo, hi) => (lo, hi),
            })
            .unzip();

        Self { mins, maxs }
    }

    pub fn width(&self) -> usize {
        self.mins.len()
    }

    pub fn min(&self, col: usize) -> f64 {
        self.mins[col]
    }

    pub fn max(&self, col: usize) -> f64 {
        self.maxs[col]
    }

    /// Observed range `max - min` of a column
    pub fn range(&self, col: usize) -> f64 {
        self.maxs[col] - self.mins[col]
    }

    /// Scale every column to [0, 1]; constant columns map to 0
    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        let mut scaled = features.to_owned();
        for (mut col, (&min, &max)) in scaled
            .axis_iter_mut(Axis(1))
            .zip(self.mins.iter().zip(&self.maxs))
        {
            let span = max - min;
            if span.abs() < 1e-10 {
                col.fill(0.0);
            } else {
                col.mapv_inplace(|v| (v - min) / span);
            }
        }
        scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scaler_fit_and_transform() {
        let features = array![[10.0, 5.0], [20.0, 5.0], [30.0, 5.0]];
        let scaler = MinMaxScaler::fit(&features);

        assert_eq!(scaler.width(), 2);
        assert_eq!(scaler.min(0), 10.0);
        assert_eq!(scaler.max(0), 30.0);
        assert_eq!(scaler.range(1), 0.0);

        let scaled = scaler.transform(&features);
        assert_eq!(scaled, array![[0.0, 0.0], [0.5, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let features = array![[0.0, 1.0], [0.0, 3.0]];
        let scaled = MinMaxScaler::fit(&features).transform(&features);
        assert!(scaled.column(0).iter().all(|v| *v == 0.0));
        assert_eq!(scaled.column(1).to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_empty_fit() {
        let scaler = MinMaxScaler::fit(&Array2::zeros((0, 3)));
        assert_eq!(scaler.width(), 3);
        assert_eq!(scaler.range(2), 0.0);
    }
}
