use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    api::{health, predict, weather},
    state::AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/health", get(health::health_check))
        .route("/predict", post(predict::predict))
        .route("/predict/simulated", post(predict::predict_simulated))
        .route("/weather/current", get(weather::current_weather))
        .route("/weather/history", get(weather::weather_history))
        .with_state(state)
}
