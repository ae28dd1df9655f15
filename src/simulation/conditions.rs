//! Panel efficiency and output estimate for current conditions

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::weather::CurrentConditions;

/// Rated output of the reference system under standard test conditions, W
pub const REFERENCE_OUTPUT_W: f64 = 1000.0;
const STC_IRRADIANCE: f64 = 1000.0;

/// Coarse severity of one environmental factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Impact {
    Low,
    Moderate,
    High,
}

impl Impact {
    fn banded(value: f64, low_below: f64, high_from: f64) -> Self {
        if value < low_below {
            Impact::Low
        } else if value < high_from {
            Impact::Moderate
        } else {
            Impact::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorImpacts {
    pub cloud_cover: Impact,
    pub humidity: Impact,
    pub dust: Impact,
    /// Irradiance shortfall: low when bright
    pub irradiance: Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarConditions {
    /// Estimated panel efficiency in [0, 100] %
    pub efficiency_percent: f64,
    /// Estimated output of a 1 kW system, W
    pub estimated_output_w: f64,
    pub uv_index: u8,
    pub impacts: FactorImpacts,
}

/// Efficiency starting from 100 % with penalties for cloud, humidity and
/// particulates, and a small bonus for moderate wind which keeps panels clean
pub fn efficiency_percent(c: &CurrentConditions) -> f64 {
    let mut efficiency = 100.0;

    if c.cloud_cover > 30.0 {
        efficiency -= (c.cloud_cover - 30.0) * 0.8;
    }
    if c.humidity > 70.0 {
        efficiency -= (c.humidity - 70.0) * 0.3;
    }
    if c.air_quality.pm2_5 > 15.0 {
        efficiency -= (c.air_quality.pm2_5 - 15.0) * 0.5;
    }
    if c.air_quality.pm10 > 30.0 {
        efficiency -= (c.air_quality.pm10 - 30.0) * 0.3;
    }
    if c.wind_speed > 3.0 && c.wind_speed < 10.0 {
        efficiency += 2.0;
    }

    efficiency.clamp(0.0, 100.0)
}

impl SolarConditions {
    pub fn assess(c: &CurrentConditions) -> Self {
        let efficiency = efficiency_percent(c);
        let output = (REFERENCE_OUTPUT_W * c.solar_irradiance / STC_IRRADIANCE * efficiency / 100.0).max(0.0);

        let irradiance = if c.solar_irradiance > 600.0 {
            Impact::Low
        } else if c.solar_irradiance > 300.0 {
            Impact::Moderate
        } else {
            Impact::High
        };

        Self {
            efficiency_percent: efficiency,
            estimated_output_w: output,
            uv_index: c.uv_index,
            impacts: FactorImpacts {
                cloud_cover: Impact::banded(c.cloud_cover, 30.0, 70.0),
                humidity: Impact::banded(c.humidity, 60.0, 80.0),
                dust: Impact::banded(c.air_quality.pm10, 50.0, 100.0),
                irradiance,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::weather::{AirQuality, Location};
    use chrono::Utc;
    use rstest::rstest;

    fn conditions(cloud: f64, humidity: f64, pm25: f64, pm10: f64, wind: f64, irr: f64) -> CurrentConditions {
        CurrentConditions {
            temperature: 20.0,
            feels_like: 20.0,
            humidity,
            pressure: 1013.0,
            wind_speed: wind,
            wind_direction: 0.0,
            cloud_cover: cloud,
            solar_irradiance: irr,
            uv_index: 5,
            air_quality: AirQuality {
                aqi: 40,
                pm2_5: pm25,
                pm10,
                o3: 50.0,
                no2: 10.0,
                so2: 5.0,
                co: 300.0,
            },
            location: Location {
                latitude: 0.0,
                longitude: 0.0,
            },
            observed_at: Utc::now(),
        }
    }

    #[rstest]
    #[case::ideal(conditions(10.0, 50.0, 5.0, 10.0, 1.0, 800.0), 100.0)]
    #[case::cloudy(conditions(80.0, 50.0, 5.0, 10.0, 1.0, 800.0), 60.0)]
    #[case::humid(conditions(10.0, 90.0, 5.0, 10.0, 1.0, 800.0), 94.0)]
    #[case::dusty(conditions(10.0, 50.0, 35.0, 80.0, 1.0, 800.0), 75.0)]
    #[case::breezy_cloudy(conditions(40.0, 50.0, 5.0, 10.0, 5.0, 800.0), 94.0)]
    #[case::floor(conditions(100.0, 100.0, 200.0, 300.0, 1.0, 800.0), 0.0)]
    fn test_efficiency(#[case] c: CurrentConditions, #[case] expected: f64) {
        assert!((efficiency_percent(&c) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_wind_bonus_capped_at_100() {
        assert_eq!(efficiency_percent(&conditions(10.0, 50.0, 5.0, 10.0, 5.0, 800.0)), 100.0);
    }

    #[test]
    fn test_assess_output() {
        let s = SolarConditions::assess(&conditions(80.0, 50.0, 5.0, 10.0, 1.0, 800.0));
        assert!((s.estimated_output_w - 480.0).abs() < 1e-9);
        assert_eq!(s.impacts.cloud_cover, Impact::High);
        assert_eq!(s.impacts.irradiance, Impact::Low);
        assert_eq!(s.impacts.dust, Impact::Low);
        assert_eq!(s.uv_index, 5);
    }
}
