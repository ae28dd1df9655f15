//! # Environment Simulation Module
//!
//! Stands in for a live weather provider, so a location alone is enough to drive
//! a prediction.
//!
//! ## Components
//!
//! - **Solar**: Clear-sky irradiance from solar position, air mass and orbital eccentricity
//! - **Weather**: Current conditions with air quality, and hourly 24-hour reading histories
//! - **Conditions**: Panel efficiency, estimated output and factor impacts
//!
//! ## Usage
//!
//! ```rust
//! use solar_yield_predictor::simulation::{Location, SolarConditions, WeatherSimulator, WeatherSimulatorConfig};
//!
//! let mut sim = WeatherSimulator::new(WeatherSimulatorConfig { random_seed: Some(42) });
//! let berlin = Location { latitude: 52.52, longitude: 13.405 };
//!
//! let now = chrono::Utc::now();
//! let current = sim.current(berlin, now);
//! let assessment = SolarConditions::assess(&current);
//! assert!((0.0..=100.0).contains(&assessment.efficiency_percent));
//!
//! let history = sim.history(berlin, now);
//! assert_eq!(history.len(), 24);
//! ```

pub mod conditions;
pub mod solar;
pub mod weather;

pub use conditions::{efficiency_percent, Impact, SolarConditions};
pub use solar::{ClearSkyModel, SolarPosition};
pub use weather::{uv_index, AirQuality, CurrentConditions, Location, WeatherSimulator, WeatherSimulatorConfig};
