// src/io/store.rs

use crate::error::Result;
use crate::evaluation::rolling::EvaluationRow;
use crate::io::demand::DemandSeries;
use crate::simulation::sensitivity::{ComparisonRow, SensitivityTable, StrategyOutcome};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEMAND_FILE: &str = "demand_history.csv";
pub const EVALUATION_FILE: &str = "forecast_evaluation.csv";
pub const RESULTS_SUMMARY_FILE: &str = "results_summary.json";
pub const COMPARISON_FILE: &str = "inventory_comparison.csv";
pub const SENSITIVITY_JSON_FILE: &str = "sensitivity.json";
pub const SENSITIVITY_CSV_FILE: &str = "sensitivity.csv";

/// Directory of persisted stage outputs.
///
/// JSON files are the exact hand-off between stages: floats are written in
/// shortest round-trip form and read back bit for bit. CSV files are for
/// people and external tools.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.path(file);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, value)?;
        Ok(path)
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let reader = BufReader::new(File::open(self.path(file))?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn write_csv<T: Serialize>(&self, file: &str, rows: &[T]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.path(file);
        write_rows(&path, rows)?;
        Ok(path)
    }

    pub fn save_demand(&self, series: &DemandSeries) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.path(DEMAND_FILE);
        series.save(&path)?;
        info!(periods = series.len(), path = %path.display(), "demand saved");
        Ok(path)
    }

    pub fn load_demand(&self) -> Result<DemandSeries> {
        DemandSeries::load(self.path(DEMAND_FILE))
    }

    pub fn save_evaluation(&self, rows: &[EvaluationRow]) -> Result<PathBuf> {
        self.write_csv(EVALUATION_FILE, rows)
    }

    pub fn save_results_summary(&self, outcomes: &[StrategyOutcome]) -> Result<PathBuf> {
        self.write_json(RESULTS_SUMMARY_FILE, &outcomes)
    }

    pub fn load_results_summary(&self) -> Result<Vec<StrategyOutcome>> {
        self.read_json(RESULTS_SUMMARY_FILE)
    }

    pub fn save_comparison(&self, rows: &[ComparisonRow]) -> Result<PathBuf> {
        self.write_csv(COMPARISON_FILE, rows)
    }

    /// Writes the table as JSON (for reloading) and CSV (for pivoting).
    pub fn save_sensitivity(&self, table: &SensitivityTable) -> Result<PathBuf> {
        let path = self.write_json(SENSITIVITY_JSON_FILE, table)?;
        self.write_csv(SENSITIVITY_CSV_FILE, &table.rows)?;
        info!(rows = table.len(), path = %path.display(), "sensitivity table saved");
        Ok(path)
    }

    pub fn load_sensitivity(&self) -> Result<SensitivityTable> {
        self.read_json(SENSITIVITY_JSON_FILE)
    }
}

/// Writes serializable rows to a CSV file.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::sensitivity::SensitivityRow;

    fn scratch(name: &str) -> ResultStore {
        ResultStore::new(
            std::env::temp_dir().join(format!("store_{name}_{}", std::process::id())),
        )
    }

    #[test]
    fn sensitivity_reload_is_bit_exact() {
        let store = scratch("sensitivity");
        let table = SensitivityTable {
            rows: vec![
                SensitivityRow {
                    strategy: "Naive".into(),
                    safety_factor: 1.28,
                    shortage_cost: 5.0,
                    total_cost: Some(0.1 + 0.2),
                    service_level_pct: Some(100.0 / 3.0),
                    average_inventory: Some(std::f64::consts::PI * 1e7),
                    average_shortage: Some(1e-300),
                    error: None,
                },
                SensitivityRow {
                    strategy: "ETS".into(),
                    safety_factor: 1.28,
                    shortage_cost: 5.0,
                    total_cost: None,
                    service_level_pct: None,
                    average_inventory: None,
                    average_shortage: None,
                    error: Some("numeric error: fit diverged".into()),
                },
            ],
        };
        store.save_sensitivity(&table).unwrap();
        let loaded = store.load_sensitivity().unwrap();
        std::fs::remove_dir_all(store.dir()).ok();

        assert_eq!(loaded.len(), table.len());
        for (a, b) in loaded.rows.iter().zip(&table.rows) {
            let bits = |v: Option<f64>| v.map(f64::to_bits);
            assert_eq!(bits(a.total_cost), bits(b.total_cost));
            assert_eq!(bits(a.service_level_pct), bits(b.service_level_pct));
            assert_eq!(bits(a.average_inventory), bits(b.average_inventory));
            assert_eq!(bits(a.average_shortage), bits(b.average_shortage));
            assert_eq!(a.safety_factor.to_bits(), b.safety_factor.to_bits());
        }
        assert_eq!(loaded, table);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let store = scratch("missing");
        assert!(matches!(
            store.load_results_summary(),
            Err(crate::error::Error::Io(_))
        ));
    }
}
