// src/simulation/config.rs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters of one order-up-to policy run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Cost per unit on hand per period (h).
    pub holding_cost: f64,
    /// Cost per backlogged unit per period (p).
    pub shortage_cost: f64,
    /// Multiple of the forecast-error standard deviation held as safety stock (z).
    pub safety_factor: f64,
    pub initial_inventory: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            holding_cost: 1.0,
            shortage_cost: 5.0,
            safety_factor: 1.28,
            initial_inventory: 50.0,
        }
    }
}

impl SimulationConfig {
    pub fn with_policy(self, safety_factor: f64, shortage_cost: f64) -> Self {
        Self {
            safety_factor,
            shortage_cost,
            ..self
        }
    }

    /// # Errors
    /// `Config` for h < 0, p < 0, z < 0 or any non-finite parameter.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("holding cost", self.holding_cost),
            ("shortage cost", self.shortage_cost),
            ("safety factor", self.safety_factor),
        ];
        for (label, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::config(format!(
                    "{label} must be a non-negative number, got {value}"
                )));
            }
        }
        if !self.initial_inventory.is_finite() {
            return Err(Error::config("initial inventory must be finite"));
        }
        Ok(())
    }
}

/// Policy grid swept by the sensitivity runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub safety_factors: Vec<f64>,
    pub shortage_costs: Vec<f64>,
    pub holding_cost: f64,
    pub initial_inventory: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            // Roughly 84%, 90% and 95% cycle service.
            safety_factors: vec![1.0, 1.28, 1.65],
            shortage_costs: vec![2.0, 5.0, 10.0],
            holding_cost: 1.0,
            initial_inventory: 50.0,
        }
    }
}

impl SweepConfig {
    /// Policy for one grid cell.
    pub fn cell(&self, safety_factor: f64, shortage_cost: f64) -> SimulationConfig {
        SimulationConfig {
            holding_cost: self.holding_cost,
            shortage_cost,
            safety_factor,
            initial_inventory: self.initial_inventory,
        }
    }

    /// # Errors
    /// `Config` for an empty axis, a duplicated grid value, or any cell whose
    /// policy is invalid.
    pub fn validate(&self) -> Result<()> {
        for (label, axis) in [
            ("safety factors", &self.safety_factors),
            ("shortage costs", &self.shortage_costs),
        ] {
            if axis.is_empty() {
                return Err(Error::config(format!("sweep needs at least one of {label}")));
            }
            for (i, a) in axis.iter().enumerate() {
                if axis[..i].iter().any(|b| b == a) {
                    return Err(Error::config(format!("duplicate value {a} in {label}")));
                }
            }
        }
        for &z in &self.safety_factors {
            for &p in &self.shortage_costs {
                self.cell(z, p).validate()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_parameters_are_rejected() {
        let base = SimulationConfig::default();
        for bad in [
            SimulationConfig {
                holding_cost: -1.0,
                ..base
            },
            SimulationConfig {
                shortage_cost: -0.5,
                ..base
            },
            SimulationConfig {
                safety_factor: -1.28,
                ..base
            },
            SimulationConfig {
                safety_factor: f64::NAN,
                ..base
            },
        ] {
            assert!(matches!(bad.validate(), Err(Error::Config(_))), "{bad:?}");
        }
        assert!(base.validate().is_ok());
    }

    #[test]
    fn zero_costs_are_valid() {
        let cfg = SimulationConfig {
            holding_cost: 0.0,
            shortage_cost: 0.0,
            safety_factor: 0.0,
            initial_inventory: -5.0,
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn sweep_defaults_match_standard_grid() {
        let sweep = SweepConfig::default();
        assert!(sweep.validate().is_ok());
        let cell = sweep.cell(1.65, 10.0);
        assert_eq!(cell.holding_cost, 1.0);
        assert_eq!(cell.initial_inventory, 50.0);
        assert_eq!(sweep.cell(1.28, 5.0), SimulationConfig::default());
    }

    #[test]
    fn sweep_rejects_duplicates_and_empty_axes() {
        let dup = SweepConfig {
            shortage_costs: vec![2.0, 2.0],
            ..SweepConfig::default()
        };
        assert!(dup.validate().is_err());
        let empty = SweepConfig {
            safety_factors: vec![],
            ..SweepConfig::default()
        };
        assert!(empty.validate().is_err());
    }
}
