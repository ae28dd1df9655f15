//! Solar power yield prediction service
//!
//! Turns batches of meteorological readings into power estimates from several
//! model variants, each with fit metrics and feature importances, and simulates
//! weather for a location when no readings are at hand.

pub mod api;
pub mod config;
pub mod domain;
pub mod ml;
pub mod prediction;
pub mod simulation;
pub mod state;
pub mod telemetry;
