//! # Weather Simulation
//!
//! Plausible weather for a location when no provider is available: current
//! conditions with an air-quality panel, and an hourly 24-hour reading history
//! suitable as prediction input.

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::solar::ClearSkyModel;
use crate::domain::{Dataset, Reading, ValidationError};

pub const HISTORY_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Air quality panel, concentrations in μg/m³
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub aqi: u32,
    pub pm2_5: f64,
    pub pm10: f64,
    pub o3: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    /// °C
    pub temperature: f64,
    pub feels_like: f64,
    /// %
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// m/s
    pub wind_speed: f64,
    /// Degrees from north
    pub wind_direction: f64,
    /// %
    pub cloud_cover: f64,
    /// W/m²
    pub solar_irradiance: f64,
    pub uv_index: u8,
    pub air_quality: AirQuality,
    pub location: Location,
    pub observed_at: DateTime<Utc>,
}

impl CurrentConditions {
    /// The subset of these conditions the predictor consumes
    pub fn to_reading(&self) -> Reading {
        Reading::new(self.temperature, self.humidity, self.wind_speed, self.solar_irradiance)
            .with_particulates(self.air_quality.pm10, self.air_quality.pm2_5)
            .with_cloud_cover(self.cloud_cover)
            .with_time(self.observed_at)
    }
}

/// UV index from irradiance, damped towards the poles, in [0, 12]
pub fn uv_index(irradiance_w_m2: f64, latitude: f64) -> u8 {
    let latitude_adjustment = 1.0 - latitude.abs() / 90.0 * 0.4;
    (irradiance_w_m2 / 125.0 * latitude_adjustment).round().clamp(0.0, 12.0) as u8
}

/// Particulate baseline for a region: (pm10, pm2.5)
fn particulate_baseline(location: Location) -> (f64, f64) {
    let lat = location.latitude;
    let lon = location.longitude;
    let desert = lat.abs() > 15.0 && lat.abs() < 35.0;
    let industrial = lat > 30.0 && lat < 60.0 && lon > -10.0 && lon < 40.0;

    if desert {
        (50.0, 25.0)
    } else if industrial {
        (30.0, 20.0)
    } else {
        (15.0, 8.0)
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherSimulatorConfig {
    /// Random seed for reproducibility (None = random)
    pub random_seed: Option<u64>,
}

pub struct WeatherSimulator {
    rng: StdRng,
}

impl WeatherSimulator {
    pub fn new(config: WeatherSimulatorConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn current(&mut self, location: Location, at: DateTime<Utc>) -> CurrentConditions {
        let rng = &mut self.rng;
        let Location { latitude, longitude } = location;

        let temperature: f64 = 30.0 - latitude.abs() / 90.0 * 30.0 + rng.gen_range(-5.0..5.0);

        let clear_sky = ClearSkyModel::new(latitude, longitude).clear_sky_irradiance(at);
        let solar_irradiance: f64 = clear_sky * rng.gen_range(0.7..=1.0);

        // Coarse stand-in for industrial longitudes
        let industrial = ((longitude / 30.0).sin() + 1.0) / 2.0;
        let air_quality = AirQuality {
            aqi: (30.0 + industrial * 70.0 + rng.gen_range(0.0..30.0)).round() as u32,
            pm2_5: round1(10.0 + industrial * 40.0 + rng.gen_range(0.0..15.0)),
            pm10: round1(20.0 + industrial * 60.0 + rng.gen_range(0.0..25.0)),
            o3: round1(40.0 + rng.gen_range(0.0..40.0)),
            no2: round1(10.0 + industrial * 30.0 + rng.gen_range(0.0..20.0)),
            so2: round1(5.0 + industrial * 25.0 + rng.gen_range(0.0..15.0)),
            co: round1(300.0 + industrial * 700.0 + rng.gen_range(0.0..300.0)),
        };

        let coastal = ((longitude / 20.0).sin() + 1.0) / 2.0;
        let wind_speed: f64 = 2.0 + coastal * 10.0 + rng.gen_range(0.0..5.0);

        CurrentConditions {
            temperature,
            feels_like: temperature - 2.0 + rng.gen_range(0.0..4.0_f64),
            humidity: (40.0_f64 + rng.gen_range(0.0..40.0)).round(),
            pressure: (1000.0_f64 + rng.gen_range(0.0..30.0)).round(),
            wind_speed,
            wind_direction: rng.gen_range(0.0..360.0_f64).round(),
            cloud_cover: (10.0_f64 + rng.gen_range(0.0..70.0)).round(),
            solar_irradiance,
            uv_index: uv_index(solar_irradiance, latitude),
            air_quality,
            location,
            observed_at: at,
        }
    }

    /// Hourly readings for the 24 hours ending at `end`, oldest first
    pub fn history(&mut self, location: Location, end: DateTime<Utc>) -> Vec<Reading> {
        let rng = &mut self.rng;
        let latitude_effect = location.latitude.abs() / 90.0;
        let (base_pm10, base_pm25) = particulate_baseline(location);

        (0..HISTORY_HOURS)
            .rev()
            .map(|hours_ago| {
                let time = end - Duration::hours(hours_ago);
                let hour = time.hour() as f64;
                let daytime = hour > 8.0 && hour < 18.0;

                let hour_factor = ((hour - 6.0) * std::f64::consts::PI / 12.0).sin();
                let temperature = 25.0 - latitude_effect * 20.0 + hour_factor * 8.0;

                let irradiance = if (6.0..=18.0).contains(&hour) {
                    (1000.0 * (1.0 - (hour - 12.0).abs() / 12.0) * (1.0 - latitude_effect)).max(0.0)
                } else {
                    0.0
                };

                let humidity_offset = if hour < 6.0 { 20.0 } else { -10.0 };
                let humidity: f64 = 50.0 + humidity_offset + rng.gen_range(0.0..15.0);
                let wind_offset = if daytime { 3.0 } else { -1.0 };
                let wind: f64 = 2.0 + wind_offset + rng.gen_range(0.0..3.0);

                let pm_factor = if daytime { 1.2 } else { 0.8 };
                let pm10: f64 = base_pm10 * pm_factor + rng.gen_range(0.0..10.0);
                let pm25: f64 = base_pm25 * pm_factor + rng.gen_range(0.0..5.0);

                let cloud_swing = if hour < 12.0 { -10.0 } else { 20.0 };
                let cloud: f64 = 20.0 + cloud_swing * rng.gen_range(0.0..1.0);

                Reading::new(
                    round1(temperature),
                    humidity.clamp(0.0, 100.0).round(),
                    round1(wind.max(0.0)),
                    irradiance.round(),
                )
                .with_particulates(round1(pm10), round1(pm25))
                .with_cloud_cover(cloud.clamp(0.0, 100.0).round())
                .with_time(time)
            })
            .collect()
    }

    pub fn history_dataset(&mut self, location: Location, end: DateTime<Utc>) -> Result<Dataset, ValidationError> {
        Dataset::new(self.history(location, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn simulator(seed: u64) -> WeatherSimulator {
        WeatherSimulator::new(WeatherSimulatorConfig { random_seed: Some(seed) })
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap()
    }

    const BERLIN: Location = Location {
        latitude: 52.52,
        longitude: 13.405,
    };

    #[test]
    fn test_current_conditions_ranges() {
        let mut sim = simulator(1);
        for _ in 0..50 {
            let c = sim.current(BERLIN, noon());
            let base = 30.0 - 52.52 / 90.0 * 30.0;
            assert!(c.temperature >= base - 5.0 && c.temperature <= base + 5.0);
            assert!((40.0..=80.0).contains(&c.humidity));
            assert!((1000.0..=1030.0).contains(&c.pressure));
            assert!((10.0..=80.0).contains(&c.cloud_cover));
            assert!(c.wind_speed >= 2.0 && c.wind_speed <= 17.0);
            assert!(c.solar_irradiance > 0.0);
            assert!(c.uv_index <= 12);
            assert!(c.air_quality.pm10 >= 20.0);
        }
    }

    #[test]
    fn test_seeded_simulation_is_reproducible() {
        let a = simulator(7).current(BERLIN, noon());
        let b = simulator(7).current(BERLIN, noon());
        assert_eq!(a, b);
    }

    #[test]
    fn test_history_shape() {
        let end = noon();
        let rows = simulator(2).history(BERLIN, end);

        assert_eq!(rows.len(), 24);
        assert_eq!(rows.last().and_then(|r| r.time), Some(end));
        assert_eq!(rows.first().and_then(|r| r.time), Some(end - Duration::hours(23)));

        for r in &rows {
            let hour = r.time.unwrap().hour();
            if !(6..=18).contains(&hour) {
                assert_eq!(r.irradiance_w_m2, 0.0, "hour {hour}");
            }
            assert!((0.0..=100.0).contains(&r.humidity_percent));
            assert!(r.pm10.unwrap() > 0.0 && r.pm25.unwrap() > 0.0);
        }

        let at_noon = rows.last().unwrap();
        // 1000 * (1 - 52.52 / 90), rounded
        assert_eq!(at_noon.irradiance_w_m2, 416.0);
    }

    #[rstest]
    #[case::desert(Location { latitude: 25.0, longitude: 45.0 }, 50.0)]
    #[case::industrial(BERLIN, 30.0)]
    #[case::elsewhere(Location { latitude: 5.0, longitude: -60.0 }, 15.0)]
    fn test_regional_particulates(#[case] location: Location, #[case] pm10_base: f64) {
        assert_eq!(particulate_baseline(location).0, pm10_base);
    }

    #[test]
    fn test_uv_index() {
        assert_eq!(uv_index(0.0, 0.0), 0);
        assert_eq!(uv_index(1000.0, 0.0), 8);
        assert_eq!(uv_index(5000.0, 0.0), 12);
        assert!(uv_index(1000.0, 60.0) < uv_index(1000.0, 0.0));
    }
}
