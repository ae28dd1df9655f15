//! Multi-model solar power prediction
//!
//! Four descriptors are evaluated side by side on one dataset, each producing
//! per-row predictions, fit metrics and a feature importance mapping.

pub mod descriptors;
pub mod dust;
pub mod engine;
pub mod formula;
pub mod importance;
pub mod metrics;

pub use descriptors::{ModelDescriptor, DESCRIPTORS};
pub use engine::{
    EngineConfig, ModelOutcome, PredictOptions, PredictionEngine, PredictionMode, PredictionReport, Provenance,
};
pub use importance::ImportanceMap;
pub use metrics::{MetricsSource, RegressionMetrics};
