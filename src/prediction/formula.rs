//! Closed-form power estimate
//!
//! Irradiance scaled by a fixed conversion factor and attenuated by temperature
//! deviation from 25 °C, humidity, particulate load and cloud cover.

use rand::Rng;

use crate::domain::Reading;

const CONVERSION: f64 = 0.2;
const REFERENCE_TEMP_C: f64 = 25.0;
const TEMP_PENALTY_PER_C: f64 = 0.01;
const HUMIDITY_PENALTY_PER_PCT: f64 = 0.003;
const PM10_PENALTY: f64 = 0.005;
const PM25_PENALTY: f64 = 0.007;
const CLOUD_DIVISOR: f64 = 200.0;

/// Jitter band emulating disagreement between model variants
pub const JITTER_MIN: f64 = 0.9;
pub const JITTER_MAX: f64 = 1.1;

fn factor(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Deterministic estimate; also used as the synthetic training label
pub fn estimate(r: &Reading) -> f64 {
    let base = r.irradiance_w_m2 * CONVERSION;
    let temp = factor(1.0 - (REFERENCE_TEMP_C - r.temperature_c).abs() * TEMP_PENALTY_PER_C);
    let humidity = factor(1.0 - r.humidity_percent * HUMIDITY_PENALTY_PER_PCT);
    let dust = factor(
        1.0 - r.pm10.unwrap_or(0.0) * PM10_PENALTY - r.pm25.unwrap_or(0.0) * PM25_PENALTY,
    );
    let cloud = factor(1.0 - r.cloud_cover_percent.unwrap_or(0.0) / CLOUD_DIVISOR);

    (base * temp * humidity * dust * cloud).max(0.0)
}

/// Estimate multiplied by a jitter drawn from [0.9, 1.1]
pub fn jittered<R: Rng>(r: &Reading, rng: &mut R) -> f64 {
    estimate(r) * rng.gen_range(JITTER_MIN..=JITTER_MAX)
}

/// Training target: observed power where present, else the estimate
pub fn label(r: &Reading) -> f64 {
    r.actual_power.unwrap_or_else(|| estimate(r))
}
