// src/io/reporting.rs

use crate::error::Result;
use crate::evaluation::rolling::EvaluationRow;
use crate::io::store::write_rows;
use crate::simulation::sensitivity::{
    ComparisonRow, SensitivityRow, SensitivityTable, StrategyOutcome,
};
use crate::simulation::config::SimulationConfig;
use crate::strategy::optimization::{critical_ratio, newsvendor_safety_factor, service_level_for};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const TRACES_FILE: &str = "traces.csv";
pub const COST_MATRIX_FILE: &str = "cost_matrix.csv";
pub const SERVICE_MATRIX_FILE: &str = "service_matrix.csv";
pub const NEWSVENDOR_FILE: &str = "newsvendor.csv";

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "✅"
    } else {
        ""
    }
}

pub fn print_evaluation(rows: &[EvaluationRow], horizon: usize) {
    println!("\nForecast Evaluation (last {horizon} periods):");
    println!("{:<16} {:>10} {:>10} {:>10}", "Model", "MAE", "RMSE", "MAPE");
    for row in rows {
        println!(
            "{:<16} {:>10} {:>10} {:>10}",
            row.strategy,
            cell(row.mae),
            cell(row.rmse),
            cell(row.mape)
        );
        if let Some(err) = &row.error {
            println!("  ! {err}");
        } else if row.mape_excluded > 0 {
            println!("  ! {} zero-demand periods left out of MAPE", row.mape_excluded);
        }
    }
}

/// Cost-optimal single-period safety factor for one shortage cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NewsvendorRow {
    pub shortage_cost: f64,
    pub holding_cost: f64,
    pub critical_ratio: f64,
    pub safety_factor: f64,
    pub service_level_pct: f64,
}

impl NewsvendorRow {
    pub fn new(shortage_cost: f64, holding_cost: f64) -> Self {
        let safety_factor = newsvendor_safety_factor(shortage_cost, holding_cost);
        Self {
            shortage_cost,
            holding_cost,
            critical_ratio: critical_ratio(shortage_cost, holding_cost),
            safety_factor,
            service_level_pct: service_level_for(safety_factor),
        }
    }
}

/// One newsvendor row per swept shortage cost.
pub fn newsvendor_rows(shortage_costs: &[f64], holding_cost: f64) -> Vec<NewsvendorRow> {
    shortage_costs
        .iter()
        .map(|&p| NewsvendorRow::new(p, holding_cost))
        .collect()
}

pub fn print_comparison(
    rows: &[ComparisonRow],
    outcomes: &[StrategyOutcome],
    policy: &SimulationConfig,
) {
    let optimal = NewsvendorRow::new(policy.shortage_cost, policy.holding_cost);
    println!("\nInventory Simulation Comparison:");
    println!(
        "Policy z = {:.2}, p = {}, h = {} (newsvendor z* = {:.2}, critical ratio {:.3})",
        policy.safety_factor,
        policy.shortage_cost,
        policy.holding_cost,
        optimal.safety_factor,
        optimal.critical_ratio
    );
    println!(
        "{:<16} {:>12} {:>5} {:>18} {:>5} {:>18} {:>17}",
        "Forecast Model",
        "Total Cost",
        "Best",
        "Service Level (%)",
        "Best",
        "Average Inventory",
        "Average Shortage"
    );
    for row in rows {
        println!(
            "{:<16} {:>12} {:>5} {:>18} {:>5} {:>18} {:>17}",
            row.strategy,
            cell(row.total_cost),
            mark(row.best_cost),
            cell(row.service_level_pct),
            mark(row.best_service),
            cell(row.average_inventory),
            cell(row.average_shortage)
        );
    }
    for outcome in outcomes {
        if let Some(err) = &outcome.error {
            println!("  ! {}: {err}", outcome.strategy);
        }
    }
}

pub fn print_sensitivity(table: &SensitivityTable, holding_cost: f64) {
    println!("\nSensitivity Analysis: inventory performance under different z and p");
    println!(
        "{:<16} {:>6} {:>9} {:>6} {:>12} {:>18} {:>18} {:>17}",
        "Forecast Model",
        "z",
        "nominal%",
        "p",
        "Total Cost",
        "Service Level (%)",
        "Average Inventory",
        "Average Shortage"
    );
    for row in &table.rows {
        println!(
            "{:<16} {:>6.2} {:>9.1} {:>6} {:>12} {:>18} {:>18} {:>17}",
            row.strategy,
            row.safety_factor,
            service_level_for(row.safety_factor),
            row.shortage_cost,
            cell(row.total_cost),
            cell(row.service_level_pct),
            cell(row.average_inventory),
            cell(row.average_shortage)
        );
    }
    let flagged: Vec<&SensitivityRow> = table.rows.iter().filter(|r| !r.is_valid()).collect();
    if !flagged.is_empty() {
        println!("  ! {} cells could not be evaluated", flagged.len());
    }

    println!("\nNewsvendor safety factor per shortage cost (h = {holding_cost}):");
    println!("{:>6} {:>15} {:>6} {:>9}", "p", "critical ratio", "z*", "nominal%");
    for row in newsvendor_rows(&table.shortage_costs(), holding_cost) {
        println!(
            "{:>6} {:>15.3} {:>6.2} {:>9.1}",
            row.shortage_cost, row.critical_ratio, row.safety_factor, row.service_level_pct
        );
    }
}

/// Long-format trace row for time-series plots.
#[derive(Debug, Clone, Serialize)]
struct TraceRow<'a> {
    strategy: &'a str,
    period: usize,
    inventory: f64,
    order: f64,
}

/// Writes a p × z pivot per strategy: columns `strategy, shortage_cost`,
/// then one column per safety factor.
fn write_matrix(
    path: &Path,
    table: &SensitivityTable,
    metric: impl Fn(&SensitivityRow) -> Option<f64> + Copy,
) -> Result<()> {
    let zs = table.safety_factors();
    let ps = table.shortage_costs();

    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["strategy".to_string(), "shortage_cost".to_string()];
    header.extend(zs.iter().map(|z| format!("z={z}")));
    wtr.write_record(&header)?;

    for strategy in table.strategies() {
        for (p, values) in ps.iter().zip(table.pivot(strategy, metric)) {
            let mut record = vec![strategy.to_string(), p.to_string()];
            record.extend(
                values
                    .into_iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&record)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the plot-ready files consumed by the external plotting step.
pub fn write_figure_data(
    dir: &Path,
    outcomes: &[StrategyOutcome],
    table: &SensitivityTable,
    holding_cost: f64,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let traces: Vec<TraceRow> = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().map(|r| (o.strategy.as_str(), r)))
        .flat_map(|(strategy, r)| {
            r.inventory_trace
                .iter()
                .zip(&r.order_trace)
                .enumerate()
                .map(move |(t, (&inventory, &order))| TraceRow {
                    strategy,
                    period: t + 1,
                    inventory,
                    order,
                })
        })
        .collect();

    let traces_path = dir.join(TRACES_FILE);
    write_rows(&traces_path, &traces)?;

    let cost_path = dir.join(COST_MATRIX_FILE);
    write_matrix(&cost_path, table, |r| r.total_cost)?;

    let service_path = dir.join(SERVICE_MATRIX_FILE);
    write_matrix(&service_path, table, |r| r.service_level_pct)?;

    let newsvendor_path = dir.join(NEWSVENDOR_FILE);
    write_rows(
        &newsvendor_path,
        &newsvendor_rows(&table.shortage_costs(), holding_cost),
    )?;

    info!(dir = %dir.display(), trace_rows = traces.len(), "figure data written");
    Ok(vec![traces_path, cost_path, service_path, newsvendor_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::engine::SimulationResult;

    fn row(strategy: &str, z: f64, p: f64, cost: Option<f64>) -> SensitivityRow {
        SensitivityRow {
            strategy: strategy.into(),
            safety_factor: z,
            shortage_cost: p,
            total_cost: cost,
            service_level_pct: cost.map(|_| 90.0),
            average_inventory: cost.map(|_| 1.0),
            average_shortage: cost.map(|_| 0.0),
            error: cost.is_none().then(|| "numeric error".to_string()),
        }
    }

    #[test]
    fn figure_files_have_expected_shape() {
        let dir = std::env::temp_dir().join(format!("figures_{}", std::process::id()));
        let outcomes = vec![StrategyOutcome {
            strategy: "Naive".into(),
            result: Some(SimulationResult {
                total_cost: 10.0,
                holding_cost: 10.0,
                shortage_cost: 0.0,
                service_level: 1.0,
                average_inventory: 10.0 / 3.0,
                average_shortage: 0.0,
                sigma: 0.0,
                inventory_trace: vec![10.0, 0.0, 0.0],
                order_trace: vec![0.0, 0.0, 10.0],
            }),
            error: None,
        }];
        let table = SensitivityTable {
            rows: vec![
                row("Naive", 1.0, 2.0, Some(1.0)),
                row("Naive", 1.0, 5.0, Some(2.0)),
                row("Naive", 1.65, 2.0, Some(3.0)),
                row("Naive", 1.65, 5.0, None),
            ],
        };
        let paths = write_figure_data(&dir, &outcomes, &table, 1.0).unwrap();
        let traces = std::fs::read_to_string(&paths[0]).unwrap();
        let matrix = std::fs::read_to_string(&paths[1]).unwrap();
        let newsvendor = std::fs::read_to_string(&paths[3]).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(paths.len(), 4);
        let newsvendor: Vec<&str> = newsvendor.lines().collect();
        assert_eq!(
            newsvendor[0],
            "shortage_cost,holding_cost,critical_ratio,safety_factor,service_level_pct"
        );
        assert_eq!(newsvendor.len(), 3);
        assert!(newsvendor[1].starts_with("2.0,1.0,"));

        assert_eq!(traces.lines().count(), 4);
        assert!(traces.starts_with("strategy,period,inventory,order"));
        let lines: Vec<&str> = matrix.lines().collect();
        assert_eq!(lines[0], "strategy,shortage_cost,z=1,z=1.65");
        assert_eq!(lines[1], "Naive,2,1,3");
        assert_eq!(lines[2], "Naive,5,2,");
    }

    #[test]
    fn newsvendor_rows_follow_the_cost_ratio() {
        let rows = newsvendor_rows(&[1.0, 5.0, 10.0], 1.0);
        assert_eq!(rows.len(), 3);
        // p = h: order the median, no safety stock.
        assert_eq!(rows[0].critical_ratio, 0.5);
        assert_eq!(rows[0].safety_factor, 0.0);
        assert!((rows[0].service_level_pct - 50.0).abs() < 1e-6);
        // p = 5h: CR = 5/6, z* close to 0.97.
        assert!((rows[1].critical_ratio - 5.0 / 6.0).abs() < 1e-12);
        assert!((rows[1].safety_factor - 0.967).abs() < 5e-3);
        assert!(rows[2].safety_factor > rows[1].safety_factor);
        assert!((rows[2].service_level_pct - rows[2].critical_ratio * 100.0).abs() < 0.1);
    }

    #[test]
    fn missing_values_render_as_na() {
        assert_eq!(cell(None), "n/a");
        assert_eq!(cell(Some(1.234)), "1.23");
    }
}
