use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::ml::ModelStore;
use crate::prediction::PredictionEngine;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub engine: Arc<PredictionEngine>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(cfg: Config) -> Self {
        let store = match &cfg.prediction.snapshot_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "model snapshots enabled");
                ModelStore::with_snapshots(dir)
            }
            None => ModelStore::in_memory(),
        };
        let engine = PredictionEngine::new(cfg.prediction.engine_config(), Arc::new(store));

        Self {
            cfg: Arc::new(cfg),
            engine: Arc::new(engine),
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
