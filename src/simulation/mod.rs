pub mod config;
pub mod engine;
pub mod sensitivity;

pub use config::{SimulationConfig, SweepConfig};
pub use engine::{InventorySimulator, SimulationResult};
pub use sensitivity::{
    compare, ComparisonRow, SensitivityRow, SensitivityRunner, SensitivityTable, StrategyOutcome,
};
