// src/pipeline.rs

//! The five stages of a study. Each reads what the previous stage persisted
//! in the [`ResultStore`] and writes its own output there.

use crate::config::AppConfig;
use crate::error::Result;
use crate::evaluation::rolling::EvaluationRow;
use crate::io::demand::{generate_seasonal_demand, DemandSeries};
use crate::io::reporting;
use crate::io::store::ResultStore;
use crate::simulation::sensitivity::{
    compare, ComparisonRow, SensitivityRunner, SensitivityTable, StrategyOutcome,
};
use crate::strategy::optimization::newsvendor_safety_factor;
use std::path::PathBuf;
use tracing::info;

pub struct Pipeline<'a> {
    config: &'a AppConfig,
    store: ResultStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            store: ResultStore::new(&config.data_dir),
        }
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Stage 1: generate and persist the demand history.
    pub fn generate(&self) -> Result<DemandSeries> {
        let series = generate_seasonal_demand(&self.config.generation)?;
        self.store.save_demand(&series)?;
        Ok(series)
    }

    /// Stage 2: rolling-origin accuracy of every strategy.
    pub fn evaluate(&self) -> Result<Vec<EvaluationRow>> {
        let demand = self.store.load_demand()?;
        let evaluator = self.config.evaluator()?;
        let strategies = self.config.build_strategies()?;
        info!(
            periods = demand.len(),
            horizon = evaluator.horizon(),
            strategies = strategies.len(),
            "evaluating forecasts"
        );
        let rows = evaluator.evaluate_all(demand.values(), &strategies)?;
        self.store.save_evaluation(&rows)?;
        Ok(rows)
    }

    /// Stage 3: every strategy under the single baseline policy.
    pub fn simulate(&self) -> Result<(Vec<StrategyOutcome>, Vec<ComparisonRow>)> {
        let demand = self.store.load_demand()?;
        let sim = &self.config.simulation;
        info!(
            h = sim.holding_cost,
            p = sim.shortage_cost,
            z = sim.safety_factor,
            initial_inventory = sim.initial_inventory,
            newsvendor_z = newsvendor_safety_factor(sim.shortage_cost, sim.holding_cost),
            "simulating baseline policy"
        );
        let runner = SensitivityRunner::new(
            self.config.build_strategies()?,
            self.config.sensitivity.clone(),
        )?;
        let outcomes = runner.baseline(demand.values(), sim)?;
        let comparison = compare(&outcomes);
        self.store.save_results_summary(&outcomes)?;
        self.store.save_comparison(&comparison)?;
        Ok((outcomes, comparison))
    }

    /// Stage 4: the policy sweep.
    pub fn sensitivity(&self) -> Result<SensitivityTable> {
        let demand = self.store.load_demand()?;
        let runner = SensitivityRunner::new(
            self.config.build_strategies()?,
            self.config.sensitivity.clone(),
        )?;
        info!(cells = runner.cells().len(), "running sensitivity sweep");
        let table = runner.run(demand.values())?;
        self.store.save_sensitivity(&table)?;
        Ok(table)
    }

    /// Stage 5: plot-ready files from the persisted results.
    pub fn figures(&self) -> Result<Vec<PathBuf>> {
        let outcomes = self.store.load_results_summary()?;
        let table = self.store.load_sensitivity()?;
        reporting::write_figure_data(
            &self.config.figures_dir,
            &outcomes,
            &table,
            self.config.sensitivity.holding_cost,
        )
    }
}
