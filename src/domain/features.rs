//! Model input features
//!
//! Every reading maps to a fixed 7-dimensional vector, in `Feature::ALL` order.
//! Optional inputs (particulates, cloud cover) default to zero.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::reading::{Dataset, Reading};

pub const FEATURE_COUNT: usize = 7;

/// Model input feature
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Feature {
    SolarIrradiance,
    Temperature,
    Humidity,
    WindSpeed,
    Pm10,
    Pm25,
    CloudCover,
}

impl Feature {
    /// Column order of the feature matrix
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::SolarIrradiance,
        Feature::Temperature,
        Feature::Humidity,
        Feature::WindSpeed,
        Feature::Pm10,
        Feature::Pm25,
        Feature::CloudCover,
    ];

    /// Column index within the feature matrix
    pub fn index(self) -> usize {
        self as usize
    }

    /// Raw value of this feature for a reading
    pub fn value(self, r: &Reading) -> f64 {
        match self {
            Feature::SolarIrradiance => r.irradiance_w_m2,
            Feature::Temperature => r.temperature_c,
            Feature::Humidity => r.humidity_percent,
            Feature::WindSpeed => r.wind_speed_ms,
            Feature::Pm10 => r.pm10.unwrap_or(0.0),
            Feature::Pm25 => r.pm25.unwrap_or(0.0),
            Feature::CloudCover => r.cloud_cover_percent.unwrap_or(0.0),
        }
    }
}

/// Raw (unscaled) feature row for one reading
pub fn feature_row(r: &Reading) -> [f64; FEATURE_COUNT] {
    Feature::ALL.map(|f| f.value(r))
}

/// Raw `(readings, FEATURE_COUNT)` matrix for a dataset
pub fn feature_matrix(dataset: &Dataset) -> Array2<f64> {
    let readings = dataset.readings();
    Array2::from_shape_fn((readings.len(), FEATURE_COUNT), |(i, j)| {
        Feature::ALL[j].value(&readings[i])
    })
}
