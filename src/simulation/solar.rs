//! # Clear-Sky Irradiance
//!
//! Solar position for a location and UTC instant, and the clear-sky irradiance
//! that follows from it: air-mass attenuated direct beam with an orbital
//! eccentricity correction, plus a fixed diffuse share.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Solar constant at mean Earth-Sun distance, W/m²
pub const SOLAR_CONSTANT: f64 = 1361.0;
/// Diffuse irradiance as a share of the direct beam on clear days
pub const DIFFUSE_FRACTION: f64 = 0.15;

/// Sun position at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    /// Angle above the horizon in degrees
    pub elevation_deg: f64,
    /// Angle from north in degrees (90 = east, 180 = south)
    pub azimuth_deg: f64,
}

/// Clear-sky solar radiation model for one location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearSkyModel {
    latitude_deg: f64,
    longitude_deg: f64,
}

impl ClearSkyModel {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
        }
    }

    /// Solar declination in degrees for a day of the year
    pub fn declination_deg(day_of_year: u32) -> f64 {
        23.45 * (360.0 / 365.0 * (day_of_year as f64 + 284.0) * PI / 180.0).sin()
    }

    /// Top-of-atmosphere irradiance, corrected for orbital eccentricity
    pub fn extraterrestrial_irradiance(day_of_year: u32) -> f64 {
        let day_angle = 2.0 * PI * day_of_year as f64 / 365.0;
        SOLAR_CONSTANT * (1.0 + 0.033 * day_angle.cos())
    }

    /// Relative optical path length (Kasten-Young)
    pub fn air_mass(elevation_deg: f64) -> f64 {
        let elevation_rad = elevation_deg * PI / 180.0;
        1.0 / (elevation_rad.sin() + 0.50572 * (6.07995 + elevation_deg).powf(-1.6364))
    }

    pub fn solar_position(&self, time: DateTime<Utc>) -> SolarPosition {
        let day_of_year = time.ordinal();
        let hour = time.hour() as f64 + time.minute() as f64 / 60.0;

        let declination_rad = Self::declination_deg(day_of_year) * PI / 180.0;
        let latitude_rad = self.latitude_deg * PI / 180.0;

        // Local solar time from UTC, hour angle folded into (-180, 180]
        let solar_time = hour + self.longitude_deg / 15.0;
        let hour_angle_deg = 180.0 - (180.0 - 15.0 * (solar_time - 12.0)).rem_euclid(360.0);
        let hour_angle_rad = hour_angle_deg * PI / 180.0;

        let elevation_sin = latitude_rad.sin() * declination_rad.sin()
            + latitude_rad.cos() * declination_rad.cos() * hour_angle_rad.cos();
        let elevation_rad = elevation_sin.clamp(-1.0, 1.0).asin();

        let azimuth_cos = (declination_rad.sin() - latitude_rad.sin() * elevation_rad.sin())
            / (latitude_rad.cos() * elevation_rad.cos());
        let mut azimuth_deg = azimuth_cos.clamp(-1.0, 1.0).acos() * 180.0 / PI;

        // Afternoon sun is in the western sky
        if hour_angle_deg > 0.0 {
            azimuth_deg = 360.0 - azimuth_deg;
        }

        SolarPosition {
            elevation_deg: elevation_rad * 180.0 / PI,
            azimuth_deg,
        }
    }

    /// Clear-sky irradiance in W/m², zero while the sun is below the horizon
    pub fn clear_sky_irradiance(&self, time: DateTime<Utc>) -> f64 {
        let position = self.solar_position(time);
        if position.elevation_deg <= 0.0 {
            return 0.0;
        }

        let transmittance = 0.7_f64.powf(Self::air_mass(position.elevation_deg).powf(0.678));
        let direct = Self::extraterrestrial_irradiance(time.ordinal()) * transmittance;

        direct * (1.0 + DIFFUSE_FRACTION)
    }
}
