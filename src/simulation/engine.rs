// src/simulation/engine.rs

use crate::error::{Error, Result};
use crate::model::state::{InventoryState, PeriodRecord};
use crate::simulation::config::SimulationConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Summary of one simulated horizon. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub total_cost: f64,
    pub holding_cost: f64,
    pub shortage_cost: f64,
    /// Fraction of periods ending with non-negative inventory, in [0, 1].
    pub service_level: f64,
    pub average_inventory: f64,
    pub average_shortage: f64,
    /// Forecast-error standard deviation behind the safety stock.
    pub sigma: f64,
    pub inventory_trace: Vec<f64>,
    pub order_trace: Vec<f64>,
}

impl SimulationResult {
    /// Aggregates a period trace.
    ///
    /// # Errors
    /// `Data` for an empty trace.
    pub fn from_records(records: &[PeriodRecord], sigma: f64) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::data("cannot summarise an empty simulation"));
        }
        let periods = records.len() as f64;

        let holding_cost: f64 = records.iter().map(|r| r.holding_cost).sum();
        let shortage_cost: f64 = records.iter().map(|r| r.shortage_cost).sum();
        let in_stock = records.iter().filter(|r| r.inventory >= 0.0).count();

        Ok(Self {
            total_cost: holding_cost + shortage_cost,
            holding_cost,
            shortage_cost,
            service_level: in_stock as f64 / periods,
            average_inventory: records.iter().map(|r| r.inventory.max(0.0)).sum::<f64>()
                / periods,
            average_shortage: records.iter().map(|r| (-r.inventory).max(0.0)).sum::<f64>()
                / periods,
            sigma,
            inventory_trace: records.iter().map(|r| r.inventory).collect(),
            order_trace: records.iter().map(|r| r.order).collect(),
        })
    }

    pub fn service_level_pct(&self) -> f64 {
        self.service_level * 100.0
    }
}

/// Population standard deviation (divisor n).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Periodic-review order-up-to simulator.
///
/// Each period: target `S_t = F_t + z·σ`, order `Q_t = max(0, S_t − I)`,
/// then `I ← I + Q_t − D_t`. σ is the standard deviation of `D − F` over the
/// whole horizon, so the safety stock is set with hindsight.
#[derive(Debug, Clone)]
pub struct InventorySimulator {
    config: SimulationConfig,
}

impl InventorySimulator {
    /// # Errors
    /// `Config` when the policy parameters are invalid.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn check_inputs(forecast: &[f64], demand: &[f64]) -> Result<()> {
        if demand.is_empty() {
            return Err(Error::data("demand series is empty"));
        }
        if forecast.len() != demand.len() {
            return Err(Error::data(format!(
                "forecast has {} periods but demand has {}",
                forecast.len(),
                demand.len()
            )));
        }
        if let Some(t) = forecast.iter().position(|f| !f.is_finite()) {
            return Err(Error::numeric(format!(
                "forecast for period {} is not finite",
                t + 1
            )));
        }
        Ok(())
    }

    /// Forecast-error standard deviation over the full horizon.
    pub fn forecast_error_sigma(forecast: &[f64], demand: &[f64]) -> f64 {
        let residuals: Vec<f64> = demand.iter().zip(forecast).map(|(d, f)| d - f).collect();
        population_std_dev(&residuals)
    }

    /// Runs the policy and returns one record per period.
    pub fn trace(&self, forecast: &[f64], demand: &[f64]) -> Result<(Vec<PeriodRecord>, f64)> {
        Self::check_inputs(forecast, demand)?;
        let sigma = Self::forecast_error_sigma(forecast, demand);
        if !sigma.is_finite() {
            return Err(Error::numeric("forecast error deviation is not finite"));
        }

        let SimulationConfig {
            holding_cost,
            shortage_cost,
            safety_factor,
            initial_inventory,
        } = self.config;
        let safety_stock = safety_factor * sigma;

        let records: Vec<PeriodRecord> = forecast
            .iter()
            .zip(demand)
            .enumerate()
            .scan(
                InventoryState::new(initial_inventory),
                |state, (t, (&f, &d))| {
                    let target_level = f + safety_stock;
                    let order = state.order_up_to(target_level);
                    state.serve_demand(d);
                    Some(PeriodRecord {
                        period: t + 1,
                        forecast: f,
                        target_level,
                        order,
                        demand: d,
                        inventory: state.level,
                        holding_cost: state.holding_cost(holding_cost),
                        shortage_cost: state.shortage_cost(shortage_cost),
                    })
                },
            )
            .collect();

        for record in records.iter().filter(|r| r.period % 5 == 0) {
            debug!(
                period = record.period,
                inventory = record.inventory,
                order = record.order,
                cost = record.holding_cost + record.shortage_cost,
                "inventory checkpoint"
            );
        }

        Ok((records, sigma))
    }

    /// Runs the policy and summarises costs and service.
    ///
    /// # Errors
    /// `Data` for empty or misaligned inputs, `Numeric` for non-finite
    /// forecasts or results.
    pub fn run(&self, forecast: &[f64], demand: &[f64]) -> Result<SimulationResult> {
        let (records, sigma) = self.trace(forecast, demand)?;
        let result = SimulationResult::from_records(&records, sigma)?;
        if !result.total_cost.is_finite() {
            return Err(Error::numeric("simulated cost is not finite"));
        }
        Ok(result)
    }
}
