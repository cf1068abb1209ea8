//! Forecast-driven inventory simulation.
//!
//! Compares demand forecasting strategies by walk-forward accuracy, drives a
//! periodic-review order-up-to policy from their forecasts, and sweeps the
//! safety factor and shortage cost to map cost/service trade-offs.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod simulation;
pub mod strategy;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
