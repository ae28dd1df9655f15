//! Share of output lost to airborne particulates

use crate::domain::{feature_matrix, Dataset};
use crate::ml::{DenseNetwork, MinMaxScaler, NetworkError};

const PM10_WEIGHT: f64 = 0.3;
const PM25_WEIGHT: f64 = 0.7;
const MAX_IMPACT: f64 = 100.0;
/// Cap for the estimate used when the regressor cannot be evaluated
const MAX_FALLBACK_IMPACT: f64 = 50.0;

/// Dust impact in percent, within [0, 100].
///
/// With a regressor, compares its mean output with and without particulates;
/// if that evaluation fails, uses mean particulate readings capped at 50.
/// Without a regressor, uses the peak particulate readings.
pub fn dust_impact(dataset: &Dataset, regressor: Option<(&DenseNetwork, &MinMaxScaler)>) -> f64 {
    if !dataset.has_dust() {
        return 0.0;
    }

    match regressor {
        Some((net, scaler)) => model_impact(dataset, net, scaler).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "model-based dust impact failed, using mean readings");
            mean_impact(dataset)
        }),
        None => peak_impact(dataset),
    }
}

fn weighted(pm10: f64, pm25: f64) -> f64 {
    pm10 * PM10_WEIGHT + pm25 * PM25_WEIGHT
}

/// `min(100, max(pm10) * 0.3 + max(pm2.5) * 0.7)`
pub fn peak_impact(dataset: &Dataset) -> f64 {
    let (pm10, pm25) = dataset.readings().iter().fold((0.0_f64, 0.0_f64), |(a, b), r| {
        (a.max(r.pm10.unwrap_or(0.0)), b.max(r.pm25.unwrap_or(0.0)))
    });

    weighted(pm10, pm25).clamp(0.0, MAX_IMPACT)
}

/// `min(50, mean(pm10) * 0.3 + mean(pm2.5) * 0.7)`
pub fn mean_impact(dataset: &Dataset) -> f64 {
    let n = dataset.len().max(1) as f64;
    let (pm10, pm25) = dataset.readings().iter().fold((0.0_f64, 0.0_f64), |(a, b), r| {
        (a + r.pm10.unwrap_or(0.0), b + r.pm25.unwrap_or(0.0))
    });

    weighted(pm10 / n, pm25 / n).clamp(0.0, MAX_FALLBACK_IMPACT)
}

/// Relative drop of the mean regressor output caused by the particulate columns
pub fn model_impact(dataset: &Dataset, net: &DenseNetwork, scaler: &MinMaxScaler) -> Result<f64, NetworkError> {
    let mean = |d: &Dataset| -> Result<f64, NetworkError> {
        let scaled = scaler.transform(&feature_matrix(d));
        Ok(net.predict_batch(scaled.view())?.mean().unwrap_or(0.0))
    };

    let dusty = mean(dataset)?;
    let clean = mean(&dataset.without_dust())?;

    if clean <= 0.0 {
        return Ok(0.0);
    }
    Ok(((clean - dusty) / clean * 100.0).clamp(0.0, MAX_IMPACT))
}
