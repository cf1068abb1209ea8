// src/simulation/sensitivity.rs

//! Policy sweep: strategies × safety factor × shortage cost.
//!
//! Forecasts do not depend on the policy, so each strategy is fitted once and
//! its in-sample series reused for every cell. Each [`GridCell`] is then an
//! independent unit of work; [`SensitivityRunner::run`] evaluates them in
//! canonical order (z outer, p middle, strategy inner) and any other executor
//! can restore that order with [`GridCell::order_key`].

use crate::error::{Error, Result};
use crate::simulation::config::{SimulationConfig, SweepConfig};
use crate::simulation::engine::{InventorySimulator, SimulationResult};
use crate::strategy::optimization::newsvendor_safety_factor;
use crate::strategy::traits::ForecastStrategy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One row of the sensitivity table. Metrics are `None` when the cell failed;
/// `error` then says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub strategy: String,
    pub safety_factor: f64,
    pub shortage_cost: f64,
    pub total_cost: Option<f64>,
    pub service_level_pct: Option<f64>,
    pub average_inventory: Option<f64>,
    pub average_shortage: Option<f64>,
    pub error: Option<String>,
}

impl SensitivityRow {
    fn completed(strategy: &str, config: &SimulationConfig, result: &SimulationResult) -> Self {
        Self {
            strategy: strategy.to_string(),
            safety_factor: config.safety_factor,
            shortage_cost: config.shortage_cost,
            total_cost: Some(result.total_cost),
            service_level_pct: Some(result.service_level_pct()),
            average_inventory: Some(result.average_inventory),
            average_shortage: Some(result.average_shortage),
            error: None,
        }
    }

    fn flagged(strategy: &str, config: &SimulationConfig, error: String) -> Self {
        Self {
            strategy: strategy.to_string(),
            safety_factor: config.safety_factor,
            shortage_cost: config.shortage_cost,
            total_cost: None,
            service_level_pct: None,
            average_inventory: None,
            average_shortage: None,
            error: Some(error),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// All sweep rows in canonical (z, p, strategy) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensitivityTable {
    pub rows: Vec<SensitivityRow>,
}

impl SensitivityTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(
        &self,
        strategy: &str,
        safety_factor: f64,
        shortage_cost: f64,
    ) -> Option<&SensitivityRow> {
        self.rows.iter().find(|r| {
            r.strategy == strategy
                && r.safety_factor == safety_factor
                && r.shortage_cost == shortage_cost
        })
    }

    /// Strategy names in first-seen order.
    pub fn strategies(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !names.contains(&row.strategy.as_str()) {
                names.push(&row.strategy);
            }
        }
        names
    }

    fn axis(&self, pick: impl Fn(&SensitivityRow) -> f64) -> Vec<f64> {
        let mut values: Vec<f64> = Vec::new();
        for row in &self.rows {
            let v = pick(row);
            if !values.contains(&v) {
                values.push(v);
            }
        }
        values
    }

    pub fn safety_factors(&self) -> Vec<f64> {
        self.axis(|r| r.safety_factor)
    }

    pub fn shortage_costs(&self) -> Vec<f64> {
        self.axis(|r| r.shortage_cost)
    }

    /// Pivot for one strategy: rows are shortage costs, columns safety factors.
    pub fn pivot(
        &self,
        strategy: &str,
        metric: impl Fn(&SensitivityRow) -> Option<f64>,
    ) -> Vec<Vec<Option<f64>>> {
        let zs = self.safety_factors();
        self.shortage_costs()
            .iter()
            .map(|&p| {
                zs.iter()
                    .map(|&z| self.get(strategy, z, p).and_then(&metric))
                    .collect()
            })
            .collect()
    }
}

/// Baseline performance of one strategy, with full traces for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub strategy: String,
    pub result: Option<SimulationResult>,
    pub error: Option<String>,
}

/// Row of the single-policy strategy comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub strategy: String,
    pub total_cost: Option<f64>,
    pub best_cost: bool,
    pub service_level_pct: Option<f64>,
    pub best_service: bool,
    pub average_inventory: Option<f64>,
    pub average_shortage: Option<f64>,
}

/// Marks the cheapest and the best-served strategy. Ties go to the first
/// strategy in configuration order; failed strategies are never marked.
pub fn compare(outcomes: &[StrategyOutcome]) -> Vec<ComparisonRow> {
    let mut rows: Vec<ComparisonRow> = outcomes
        .iter()
        .map(|o| ComparisonRow {
            strategy: o.strategy.clone(),
            total_cost: o.result.as_ref().map(|r| r.total_cost),
            best_cost: false,
            service_level_pct: o.result.as_ref().map(|r| r.service_level_pct()),
            best_service: false,
            average_inventory: o.result.as_ref().map(|r| r.average_inventory),
            average_shortage: o.result.as_ref().map(|r| r.average_shortage),
        })
        .collect();

    let mut best_cost: Option<(usize, f64)> = None;
    let mut best_service: Option<(usize, f64)> = None;
    for (i, row) in rows.iter().enumerate() {
        if let Some(cost) = row.total_cost {
            if best_cost.map_or(true, |(_, c)| cost < c) {
                best_cost = Some((i, cost));
            }
        }
        if let Some(service) = row.service_level_pct {
            if best_service.map_or(true, |(_, s)| service > s) {
                best_service = Some((i, service));
            }
        }
    }
    if let Some((i, _)) = best_cost {
        rows[i].best_cost = true;
    }
    if let Some((i, _)) = best_service {
        rows[i].best_service = true;
    }
    rows
}

/// In-sample forecast of one strategy, or the reason it could not be made.
#[derive(Debug)]
pub struct StrategyForecast {
    pub strategy: String,
    pub fitted: Result<Vec<f64>>,
}

/// Coordinates of one sweep cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub z_index: usize,
    pub p_index: usize,
    pub strategy_index: usize,
    pub safety_factor: f64,
    pub shortage_cost: f64,
}

impl GridCell {
    /// Sort key of the canonical reporting order.
    pub fn order_key(&self) -> (usize, usize, usize) {
        (self.z_index, self.p_index, self.strategy_index)
    }
}

pub struct SensitivityRunner {
    strategies: Vec<Box<dyn ForecastStrategy>>,
    sweep: SweepConfig,
}

impl SensitivityRunner {
    /// # Errors
    /// `Config` for an invalid sweep or an empty strategy list.
    pub fn new(strategies: Vec<Box<dyn ForecastStrategy>>, sweep: SweepConfig) -> Result<Self> {
        sweep.validate()?;
        if strategies.is_empty() {
            return Err(Error::config("sensitivity sweep needs at least one strategy"));
        }
        for (i, s) in strategies.iter().enumerate() {
            if strategies[..i].iter().any(|o| o.name() == s.name()) {
                return Err(Error::config(format!("duplicate strategy name '{}'", s.name())));
            }
        }
        Ok(Self { strategies, sweep })
    }

    pub fn sweep(&self) -> &SweepConfig {
        &self.sweep
    }

    pub fn strategies(&self) -> &[Box<dyn ForecastStrategy>] {
        &self.strategies
    }

    /// Fits every strategy once. Recoverable failures are kept per strategy;
    /// configuration or data failures abort.
    pub fn prepare(&self, demand: &[f64]) -> Result<Vec<StrategyForecast>> {
        self.strategies
            .iter()
            .map(|strategy| {
                let fitted = match strategy.fit_in_sample(demand) {
                    Ok(fitted) => {
                        debug!(strategy = strategy.name(), "in-sample forecast ready");
                        Ok(fitted)
                    }
                    Err(e) if e.is_recoverable() => {
                        warn!(
                            strategy = strategy.name(),
                            error = %e,
                            "strategy could not be fitted"
                        );
                        Err(e)
                    }
                    Err(e) => return Err(e),
                };
                Ok(StrategyForecast {
                    strategy: strategy.name().to_string(),
                    fitted,
                })
            })
            .collect()
    }

    /// Every cell in canonical order.
    pub fn cells(&self) -> Vec<GridCell> {
        let mut cells = Vec::new();
        for (z_index, &safety_factor) in self.sweep.safety_factors.iter().enumerate() {
            for (p_index, &shortage_cost) in self.sweep.shortage_costs.iter().enumerate() {
                for strategy_index in 0..self.strategies.len() {
                    cells.push(GridCell {
                        z_index,
                        p_index,
                        strategy_index,
                        safety_factor,
                        shortage_cost,
                    });
                }
            }
        }
        cells
    }

    /// Evaluates one cell. Only non-recoverable errors escape; numeric trouble
    /// becomes a flagged row.
    pub fn run_cell(
        &self,
        cell: &GridCell,
        forecasts: &[StrategyForecast],
        demand: &[f64],
    ) -> Result<SensitivityRow> {
        let forecast = &forecasts[cell.strategy_index];
        let config = self.sweep.cell(cell.safety_factor, cell.shortage_cost);

        let fitted = match &forecast.fitted {
            Ok(fitted) => fitted,
            Err(e) => {
                return Ok(SensitivityRow::flagged(
                    &forecast.strategy,
                    &config,
                    e.to_string(),
                ))
            }
        };

        match InventorySimulator::new(config).and_then(|sim| sim.run(fitted, demand)) {
            Ok(result) => Ok(SensitivityRow::completed(&forecast.strategy, &config, &result)),
            Err(e) if e.is_recoverable() => {
                warn!(
                    strategy = %forecast.strategy,
                    z = cell.safety_factor,
                    p = cell.shortage_cost,
                    error = %e,
                    "sweep cell failed"
                );
                Ok(SensitivityRow::flagged(&forecast.strategy, &config, e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Runs the full grid: exactly |Z|·|P|·|strategies| rows.
    pub fn run(&self, demand: &[f64]) -> Result<SensitivityTable> {
        let forecasts = self.prepare(demand)?;

        for &p in &self.sweep.shortage_costs {
            info!(
                shortage_cost = p,
                holding_cost = self.sweep.holding_cost,
                newsvendor_z = newsvendor_safety_factor(p, self.sweep.holding_cost),
                "cost-optimal single-period safety factor"
            );
        }

        let mut cells = self.cells();
        cells.sort_by_key(GridCell::order_key);
        let rows = cells
            .iter()
            .map(|cell| self.run_cell(cell, &forecasts, demand))
            .collect::<Result<Vec<_>>>()?;

        let flagged = rows.iter().filter(|r| !r.is_valid()).count();
        info!(rows = rows.len(), flagged, "sensitivity sweep complete");
        Ok(SensitivityTable { rows })
    }

    /// Simulates every strategy under the single `policy`, keeping traces.
    /// The policy need not be a cell of the sweep.
    pub fn baseline(
        &self,
        demand: &[f64],
        policy: &SimulationConfig,
    ) -> Result<Vec<StrategyOutcome>> {
        let simulator = InventorySimulator::new(*policy)?;
        let forecasts = self.prepare(demand)?;

        forecasts
            .into_iter()
            .map(|forecast| {
                let outcome = forecast.fitted.and_then(|fitted| simulator.run(&fitted, demand));
                match outcome {
                    Ok(result) => Ok(StrategyOutcome {
                        strategy: forecast.strategy,
                        result: Some(result),
                        error: None,
                    }),
                    Err(e) if e.is_recoverable() => Ok(StrategyOutcome {
                        strategy: forecast.strategy,
                        result: None,
                        error: Some(e.to_string()),
                    }),
                    Err(e) => Err(e),
                }
            })
            .collect()
    }
}
