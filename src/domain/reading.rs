//! Meteorological readings and dataset validation
//!
//! A `ReadingRow` is the loosely-typed wire form of one spreadsheet row. A `Dataset`
//! is the validated, non-empty, ordered sequence of `Reading`s the prediction
//! routine works on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns every dataset must carry
pub const REQUIRED_COLUMNS: [&str; 4] = ["temperature", "humidity", "windSpeed", "solarIrradiance"];

/// One row of meteorological input as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_irradiance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(default, alias = "pm2_5", skip_serializing_if = "Option::is_none")]
    pub pm25: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_power: Option<f64>,
    #[serde(default, alias = "timestamp", skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

impl ReadingRow {
    /// Names of required columns absent from this row
    pub fn missing_columns(&self) -> Vec<&'static str> {
        let present = [
            self.temperature.is_some(),
            self.humidity.is_some(),
            self.wind_speed.is_some(),
            self.solar_irradiance.is_some(),
        ];
        REQUIRED_COLUMNS
            .iter()
            .zip(present)
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| *name)
            .collect()
    }
}

impl From<&Reading> for ReadingRow {
    fn from(r: &Reading) -> Self {
        Self {
            temperature: Some(r.temperature_c),
            humidity: Some(r.humidity_percent),
            wind_speed: Some(r.wind_speed_ms),
            solar_irradiance: Some(r.irradiance_w_m2),
            pm10: r.pm10,
            pm25: r.pm25,
            cloud_cover: r.cloud_cover_percent,
            actual_power: r.actual_power,
            time: r.time,
        }
    }
}

/// A validated meteorological reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub wind_speed_ms: f64,
    pub irradiance_w_m2: f64,
    pub pm10: Option<f64>,
    pub pm25: Option<f64>,
    pub cloud_cover_percent: Option<f64>,
    pub actual_power: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

impl Reading {
    /// Reading with only the required fields set
    pub fn new(temperature_c: f64, humidity_percent: f64, wind_speed_ms: f64, irradiance_w_m2: f64) -> Self {
        Self {
            temperature_c,
            humidity_percent,
            wind_speed_ms,
            irradiance_w_m2,
            pm10: None,
            pm25: None,
            cloud_cover_percent: None,
            actual_power: None,
            time: None,
        }
    }

    pub fn with_particulates(mut self, pm10: f64, pm25: f64) -> Self {
        self.pm10 = Some(pm10);
        self.pm25 = Some(pm25);
        self
    }

    pub fn with_cloud_cover(mut self, percent: f64) -> Self {
        self.cloud_cover_percent = Some(percent);
        self
    }

    pub fn with_actual_power(mut self, power: f64) -> Self {
        self.actual_power = Some(power);
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    fn from_row(index: usize, row: &ReadingRow) -> Result<Self, ValidationError> {
        let required = |name: &'static str, value: Option<f64>| -> Result<f64, ValidationError> {
            let v = value.ok_or(ValidationError::MissingValue { row: index, column: name })?;
            finite(index, name, v)
        };
        let optional = |name: &'static str, value: Option<f64>| -> Result<Option<f64>, ValidationError> {
            value.map(|v| finite(index, name, v)).transpose()
        };

        Ok(Self {
            temperature_c: required("temperature", row.temperature)?,
            humidity_percent: required("humidity", row.humidity)?,
            wind_speed_ms: required("windSpeed", row.wind_speed)?,
            irradiance_w_m2: required("solarIrradiance", row.solar_irradiance)?,
            pm10: optional("pm10", row.pm10)?,
            pm25: optional("pm25", row.pm25)?,
            cloud_cover_percent: optional("cloudCover", row.cloud_cover)?,
            actual_power: optional("actualPower", row.actual_power)?,
            time: row.time,
        })
    }
}

fn finite(row: usize, column: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFinite { row, column })
    }
}

/// Input rejection reasons, raised before any prediction work starts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("the dataset contains no rows")]
    Empty,

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),

    #[error("row {row}: missing value for required column '{column}'")]
    MissingValue { row: usize, column: &'static str },

    #[error("row {row}: value for '{column}' is not a finite number")]
    NonFinite { row: usize, column: &'static str },
}

/// Non-empty ordered sequence of readings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    readings: Vec<Reading>,
}

impl Dataset {
    /// Validate raw rows. Column presence is checked on the first row, like a
    /// spreadsheet header; every later row must still carry the required values.
    pub fn from_rows(rows: &[ReadingRow]) -> Result<Self, ValidationError> {
        let first = rows.first().ok_or(ValidationError::Empty)?;

        let missing = first.missing_columns();
        if !missing.is_empty() {
            return Err(ValidationError::MissingColumns(missing));
        }

        let readings = rows
            .iter()
            .enumerate()
            .map(|(i, row)| Reading::from_row(i, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { readings })
    }

    pub fn new(readings: Vec<Reading>) -> Result<Self, ValidationError> {
        if readings.is_empty() {
            return Err(ValidationError::Empty);
        }
        Ok(Self { readings })
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// True when at least one reading carries observed power
    pub fn has_actual_power(&self) -> bool {
        self.readings.iter().any(|r| r.actual_power.is_some())
    }

    /// Observed power per row, `None` where a row has none
    pub fn actual_power(&self) -> Vec<Option<f64>> {
        self.readings.iter().map(|r| r.actual_power).collect()
    }

    /// True when any row reports a positive particulate concentration
    pub fn has_dust(&self) -> bool {
        self.readings
            .iter()
            .any(|r| r.pm10.unwrap_or(0.0) > 0.0 || r.pm25.unwrap_or(0.0) > 0.0)
    }

    /// Copy of this dataset with particulate readings removed
    pub fn without_dust(&self) -> Self {
        let readings = self
            .readings
            .iter()
            .map(|r| Reading {
                pm10: None,
                pm25: None,
                ..r.clone()
            })
            .collect();
        Self { readings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(t: f64, h: f64, w: f64, irr: f64) -> ReadingRow {
        ReadingRow {
            temperature: Some(t),
            humidity: Some(h),
            wind_speed: Some(w),
            solar_irradiance: Some(irr),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_rows_rejected() {
        assert_eq!(Dataset::from_rows(&[]), Err(ValidationError::Empty));
    }

    #[test]
    fn test_missing_column_in_first_row() {
        let mut first = row(20.0, 50.0, 3.0, 500.0);
        first.wind_speed = None;
        first.solar_irradiance = None;

        let err = Dataset::from_rows(&[first, row(20.0, 50.0, 3.0, 500.0)]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingColumns(vec!["windSpeed", "solarIrradiance"])
        );
        assert_eq!(err.to_string(), "missing required columns: windSpeed, solarIrradiance");
    }

    #[test]
    fn test_missing_value_in_later_row() {
        let mut second = row(20.0, 50.0, 3.0, 500.0);
        second.humidity = None;

        let err = Dataset::from_rows(&[row(20.0, 50.0, 3.0, 500.0), second]).unwrap_err();
        assert_eq!(err, ValidationError::MissingValue { row: 1, column: "humidity" });
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut r = row(20.0, 50.0, 3.0, 500.0);
        r.pm10 = Some(f64::NAN);
        let err = Dataset::from_rows(&[r]).unwrap_err();
        assert_eq!(err, ValidationError::NonFinite { row: 0, column: "pm10" });
    }

    #[test]
    fn test_row_json_aliases() {
        let json = r#"{
            "temperature": 21.5, "humidity": 40, "windSpeed": 2.5,
            "solarIrradiance": 640, "pm2_5": 12.0, "cloudCover": 30,
            "actualPower": 95.0, "timestamp": "2024-06-21T12:00:00Z"
        }"#;
        let r: ReadingRow = serde_json::from_str(json).unwrap();
        assert_eq!(r.pm25, Some(12.0));
        assert_eq!(r.actual_power, Some(95.0));
        assert!(r.time.is_some());
        assert!(r.missing_columns().is_empty());
    }

    #[test]
    fn test_dataset_flags() {
        let rows = vec![row(25.0, 50.0, 3.0, 800.0), {
            let mut r = row(10.0, 90.0, 1.0, 0.0);
            r.pm10 = Some(40.0);
            r.actual_power = Some(0.0);
            r
        }];
        let ds = Dataset::from_rows(&rows).unwrap();

        assert_eq!(ds.len(), 2);
        assert!(ds.has_actual_power());
        assert_eq!(ds.actual_power(), vec![None, Some(0.0)]);
        assert!(ds.has_dust());
        assert!(!ds.without_dust().has_dust());
    }
}
