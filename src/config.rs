// src/config.rs

use crate::error::{Error, Result};
use crate::evaluation::rolling::RollingOriginEvaluator;
use crate::io::demand::DemandParams;
use crate::simulation::config::{SimulationConfig, SweepConfig};
use crate::strategy::implementations::{build_strategies, StrategySpec};
use crate::strategy::traits::ForecastStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Number of trailing periods forecast out of sample.
    pub horizon: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { horizon: 12 }
    }
}

/// Everything a pipeline run needs, read once and passed down by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where stage outputs are written and read back.
    pub data_dir: PathBuf,
    /// Where plot-ready files go.
    pub figures_dir: PathBuf,
    pub generation: DemandParams,
    pub evaluation: EvaluationConfig,
    pub simulation: SimulationConfig,
    pub sensitivity: SweepConfig,
    pub strategies: Vec<StrategySpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            figures_dir: PathBuf::from("figures"),
            generation: DemandParams::default(),
            evaluation: EvaluationConfig::default(),
            simulation: SimulationConfig::default(),
            sensitivity: SweepConfig::default(),
            strategies: StrategySpec::defaults(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`. When `required` is false a missing file yields the
    /// built-in defaults.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() && !required {
            debug!(path = %path.display(), "no config file, using defaults");
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Checks every section so bad parameters surface before any stage runs.
    pub fn validate(&self) -> Result<()> {
        self.generation.validate()?;
        RollingOriginEvaluator::new(self.evaluation.horizon)?;
        self.simulation.validate()?;
        self.sensitivity.validate()?;
        if self.strategies.is_empty() {
            return Err(Error::config("at least one forecast strategy is required"));
        }
        build_strategies(&self.strategies)?;
        Ok(())
    }

    pub fn evaluator(&self) -> Result<RollingOriginEvaluator> {
        RollingOriginEvaluator::new(self.evaluation.horizon)
    }

    pub fn build_strategies(&self) -> Result<Vec<Box<dyn ForecastStrategy>>> {
        build_strategies(&self.strategies)
    }
}
