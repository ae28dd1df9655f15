//! Prediction endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::time::Instant;
use validator::{Validate, ValidationErrors};

use crate::{
    api::{
        error::ApiError,
        response::ApiResponse,
        weather::{check_coordinates, simulator, validated},
    },
    domain::{Dataset, ReadingRow},
    prediction::{PredictOptions, PredictionMode, PredictionReport},
    simulation::Location,
    state::AppState,
};

fn default_train() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub rows: Vec<ReadingRow>,
    pub mode: Option<PredictionMode>,
    #[serde(default = "default_train")]
    pub train: bool,
    pub seed: Option<u64>,
}

impl PredictRequest {
    fn options(&self) -> PredictOptions {
        PredictOptions {
            mode: self.mode,
            train: self.train,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SimulatedPredictQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub seed: Option<u64>,
    pub mode: Option<PredictionMode>,
}

impl Validate for SimulatedPredictQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        check_coordinates(self.latitude, self.longitude)
    }
}

/// Run the engine off the async runtime
async fn run(state: &AppState, dataset: Dataset, options: PredictOptions) -> Result<PredictionReport, ApiError> {
    let engine = state.engine.clone();
    let report = tokio::task::spawn_blocking(move || engine.predict(&dataset, &options)).await?;

    let fallbacks = report.outcomes.iter().filter(|o| o.provenance.is_fallback()).count();
    tracing::info!(
        report_id = %report.id,
        mode = %report.mode,
        fallbacks,
        dust_impact = report.dust_impact,
        "prediction complete"
    );
    Ok(report)
}

/// POST /api/v1/predict
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PredictionReport>>, ApiError> {
    let started = Instant::now();
    let Json(request) = payload?;

    let dataset = Dataset::from_rows(&request.rows)?;
    let rows = dataset.len();
    let report = run(&state, dataset, request.options()).await?;

    Ok(Json(
        ApiResponse::success(report)
            .with_count(rows)
            .with_duration(started.elapsed().as_millis() as u64),
    ))
}

/// POST /api/v1/predict/simulated
pub async fn predict_simulated(
    State(state): State<AppState>,
    query: Result<Query<SimulatedPredictQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PredictionReport>>, ApiError> {
    let started = Instant::now();
    let q = validated(query)?;
    let location = Location {
        latitude: q.latitude,
        longitude: q.longitude,
    };

    let dataset = simulator(&state, q.seed).history_dataset(location, Utc::now())?;
    let rows = dataset.len();
    let options = PredictOptions {
        mode: q.mode,
        train: true,
        seed: q.seed,
    };
    let report = run(&state, dataset, options).await?;

    Ok(Json(
        ApiResponse::success(report)
            .with_count(rows)
            .with_duration(started.elapsed().as_millis() as u64),
    ))
}
