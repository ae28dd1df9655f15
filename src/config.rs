use anyhow::{ensure, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ml::TrainingConfig;
use crate::prediction::{EngineConfig, PredictionMode};
use crate::simulation::WeatherSimulatorConfig;

pub const ENV_PREFIX: &str = "SYP__";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub prediction: PredictionConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            request_timeout_secs: 30,
            enable_cors: false,
            body_limit_bytes: 2 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    pub mode: PredictionMode,
    pub epochs: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    /// Directory for model snapshots; none disables them
    pub snapshot_dir: Option<PathBuf>,
    pub random_seed: Option<u64>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        let training = TrainingConfig::default();
        Self {
            mode: PredictionMode::default(),
            epochs: training.epochs,
            learning_rate: training.learning_rate,
            batch_size: training.batch_size,
            snapshot_dir: None,
            random_seed: None,
        }
    }
}

impl PredictionConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            mode: self.mode,
            training: TrainingConfig {
                epochs: self.epochs,
                learning_rate: self.learning_rate,
                batch_size: self.batch_size,
            },
            random_seed: self.random_seed,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub random_seed: Option<u64>,
}

impl SimulationConfig {
    /// Simulator settings, a per-request seed taking precedence
    pub fn simulator_config(&self, seed: Option<u64>) -> WeatherSimulatorConfig {
        WeatherSimulatorConfig {
            random_seed: seed.or(self.random_seed),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Self = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.server.request_timeout_secs > 0, "server.request_timeout_secs must be > 0");
        ensure!(self.prediction.batch_size > 0, "prediction.batch_size must be > 0");
        ensure!(
            self.prediction.learning_rate.is_finite() && self.prediction.learning_rate > 0.0,
            "prediction.learning_rate must be a positive number"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::from_figment(Figment::from(Serialized::defaults(Config::default()))).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.prediction.mode, PredictionMode::Regressor);
        assert_eq!(cfg.prediction.epochs, 20);
        assert!(cfg.prediction.snapshot_dir.is_none());
    }

    #[test]
    fn test_toml_overrides() {
        let toml = r#"
            [server]
            port = 9000

            [prediction]
            mode = "formula"
            epochs = 5
            snapshot_dir = "/tmp/models"

            [simulation]
            random_seed = 7
        "#;
        let cfg = Config::from_figment(
            Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml)),
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.request_timeout_secs, 30);
        assert_eq!(cfg.prediction.mode, PredictionMode::Formula);
        assert_eq!(cfg.prediction.engine_config().training.epochs, 5);
        assert_eq!(cfg.prediction.snapshot_dir, Some(PathBuf::from("/tmp/models")));
        assert_eq!(cfg.simulation.simulator_config(None).random_seed, Some(7));
        assert_eq!(cfg.simulation.simulator_config(Some(1)).random_seed, Some(1));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let toml = "[prediction]\nbatch_size = 0\n";
        let result = Config::from_figment(
            Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml)),
        );
        assert!(result.is_err());
    }
}
