//! Simulated weather endpoints

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    api::{error::ApiError, response::ApiResponse},
    domain::ReadingRow,
    simulation::{CurrentConditions, Location, SolarConditions, WeatherSimulator},
    state::AppState,
};

/// Coordinates plus an optional seed for reproducible output
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub seed: Option<u64>,
}

impl Validate for LocationQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        check_coordinates(self.latitude, self.longitude)
    }
}

impl LocationQuery {
    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

fn out_of_range(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("range");
    error.message = Some(message.into());
    error
}

/// Latitude within [-90, 90] and longitude within [-180, 180]; NaN fails both
pub(crate) fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !(-90.0..=90.0).contains(&latitude) {
        errors.add("latitude", out_of_range("latitude must be within [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        errors.add("longitude", out_of_range("longitude must be within [-180, 180]"));
    }

    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Extract a query and run its `Validate` checks
pub(crate) fn validated<T: Validate>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    let Query(q) = query?;
    q.validate()?;
    Ok(q)
}

pub(crate) fn simulator(state: &AppState, seed: Option<u64>) -> WeatherSimulator {
    WeatherSimulator::new(state.cfg.simulation.simulator_config(seed))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeatherResponse {
    #[serde(flatten)]
    pub conditions: CurrentConditions,
    pub solar: SolarConditions,
}

/// GET /api/v1/weather/current
pub async fn current_weather(
    State(state): State<AppState>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<CurrentWeatherResponse>>, ApiError> {
    let q = validated(query)?;
    tracing::debug!(latitude = q.latitude, longitude = q.longitude, "simulating current weather");

    let conditions = simulator(&state, q.seed).current(q.location(), Utc::now());
    let solar = SolarConditions::assess(&conditions);

    Ok(Json(ApiResponse::success(CurrentWeatherResponse { conditions, solar })))
}

/// GET /api/v1/weather/history
pub async fn weather_history(
    State(state): State<AppState>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<ReadingRow>>>, ApiError> {
    let q = validated(query)?;
    tracing::debug!(latitude = q.latitude, longitude = q.longitude, "simulating weather history");

    let rows: Vec<ReadingRow> = simulator(&state, q.seed)
        .history(q.location(), Utc::now())
        .iter()
        .map(ReadingRow::from)
        .collect();
    let count = rows.len();

    Ok(Json(ApiResponse::success(rows).with_count(count)))
}
