#![cfg(test)]
//! Load Testing Suite
//!
//! Concurrent prediction pressure against one shared engine and model store.
//! Every report must stay well-formed while descriptors race on the cache.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

use solar_yield_predictor::domain::Dataset;
use solar_yield_predictor::ml::ModelStore;
use solar_yield_predictor::prediction::{EngineConfig, PredictOptions, PredictionEngine, PredictionMode};
use solar_yield_predictor::simulation::{Location, WeatherSimulator, WeatherSimulatorConfig};

fn dataset(seed: u64) -> Dataset {
    let mut sim = WeatherSimulator::new(WeatherSimulatorConfig { random_seed: Some(seed) });
    let location = Location {
        latitude: 40.0 + (seed % 20) as f64,
        longitude: (seed % 60) as f64,
    };
    sim.history_dataset(location, chrono::Utc::now()).unwrap()
}

#[tokio::test]
async fn test_concurrent_predictions_share_store() {
    let store = Arc::new(ModelStore::in_memory());
    let engine = Arc::new(PredictionEngine::new(EngineConfig::default(), store.clone()));

    let mut tasks = JoinSet::new();
    for i in 0..8u64 {
        let engine = engine.clone();
        tasks.spawn_blocking(move || {
            let d = dataset(i);
            let options = PredictOptions {
                mode: Some(PredictionMode::Regressor),
                train: true,
                seed: Some(i),
            };
            (d.len(), engine.predict(&d, &options))
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (rows, report) = joined.unwrap();
        assert_eq!(report.outcomes.len(), 4);
        for o in &report.outcomes {
            assert_eq!(o.predictions.len(), rows);
        }
    }
    assert_eq!(store.len(), 4);
}

#[tokio::test]
#[ignore]
async fn test_sustained_prediction_throughput() {
    let engine = Arc::new(PredictionEngine::new(
        EngineConfig::default(),
        Arc::new(ModelStore::in_memory()),
    ));
    let started = Instant::now();

    let mut tasks = JoinSet::new();
    for i in 0..200u64 {
        let engine = engine.clone();
        tasks.spawn_blocking(move || {
            let d = dataset(i);
            engine.predict(&d, &PredictOptions::default())
        });
    }

    let mut fallbacks = 0;
    while let Some(joined) = tasks.join_next().await {
        let report = joined.unwrap();
        fallbacks += report.outcomes.iter().filter(|o| o.provenance.is_fallback()).count();
    }

    let elapsed = started.elapsed();
    println!("200 predictions in {elapsed:?}, {fallbacks} fallback outcomes");
    assert_eq!(fallbacks, 0);
    assert!(elapsed < Duration::from_secs(120));
}
