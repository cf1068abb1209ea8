// src/io/demand.rs

use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of the demand file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub period: u32,
    pub demand: f64,
}

/// Demand history: contiguous periods starting at 1, non-negative values.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandSeries {
    values: Vec<f64>,
}

impl DemandSeries {
    /// # Errors
    /// `Data` for an empty series or a negative / non-finite value.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::data("demand series is empty"));
        }
        if let Some(t) = values.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::data(format!(
                "demand for period {} is {}; demand must be a non-negative number",
                t + 1,
                values[t]
            )));
        }
        Ok(Self { values })
    }

    /// Validates file rows: periods must run 1, 2, 3, ... without gaps.
    pub fn from_records(records: &[DemandRecord]) -> Result<Self> {
        for (i, record) in records.iter().enumerate() {
            let expected = i as u32 + 1;
            if record.period != expected {
                return Err(Error::data(format!(
                    "expected period {expected}, found {} (row {})",
                    record.period,
                    i + 1
                )));
            }
        }
        Self::new(records.iter().map(|r| r.demand).collect())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn records(&self) -> Vec<DemandRecord> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &demand)| DemandRecord {
                period: i as u32 + 1,
                demand,
            })
            .collect()
    }

    /// Reads a `period,demand` CSV file. A missing or unreadable file is a
    /// `Data` error like a malformed one.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = csv::Reader::from_path(path).map_err(|e| {
            Error::data(format!("cannot read demand file {}: {e}", path.display()))
        })?;
        let records = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<DemandRecord>, csv::Error>>()
            .map_err(|e| Error::data(format!("malformed demand file: {e}")))?;
        Self::from_records(&records)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path.as_ref())?;
        for record in self.records() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Parameters of the synthetic demand pattern
/// `max(μ + β·t + A·sin(2πt/L) + ε_t, 0)`, ε ~ N(0, σ).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandParams {
    pub periods: usize,
    pub base_level: f64,
    pub trend: f64,
    pub amplitude: f64,
    pub season_length: usize,
    pub noise_std_dev: f64,
    pub seed: u64,
}

impl Default for DemandParams {
    fn default() -> Self {
        Self {
            periods: 36,
            base_level: 100.0,
            trend: 0.5,
            amplitude: 15.0,
            season_length: 12,
            noise_std_dev: 10.0,
            seed: 42,
        }
    }
}

impl DemandParams {
    pub fn validate(&self) -> Result<()> {
        if self.periods == 0 {
            return Err(Error::config("demand generation needs at least one period"));
        }
        if self.season_length == 0 {
            return Err(Error::config("season length must be positive"));
        }
        if !self.noise_std_dev.is_finite() || self.noise_std_dev < 0.0 {
            return Err(Error::config(format!(
                "noise standard deviation must be non-negative, got {}",
                self.noise_std_dev
            )));
        }
        Ok(())
    }
}

/// Generates a seeded trend + seasonal + noise demand series.
/// The same parameters always give the same series.
pub fn generate_seasonal_demand(params: &DemandParams) -> Result<DemandSeries> {
    params.validate()?;
    let mut rng = StdRng::seed_from_u64(params.seed);
    let normal = Normal::new(0.0, params.noise_std_dev)
        .map_err(|e| Error::config(format!("invalid noise distribution: {e}")))?;

    let values = (1..=params.periods)
        .map(|t| {
            let t = t as f64;
            let seasonality = params.amplitude
                * (2.0 * std::f64::consts::PI * t / params.season_length as f64).sin();
            let noise: f64 = normal.sample(&mut rng);
            (params.base_level + params.trend * t + seasonality + noise).max(0.0)
        })
        .collect();

    DemandSeries::new(values)
}

/// Generates a demand schedule where every period has the same value.
/// Useful for testing steady-state behaviour.
pub fn generate_constant_demand(periods: usize, value: f64) -> Result<DemandSeries> {
    DemandSeries::new(vec![value; periods])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_reproducible() {
        let params = DemandParams::default();
        let a = generate_seasonal_demand(&params).unwrap();
        let b = generate_seasonal_demand(&params).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 36);
        assert!(a.values().iter().all(|v| *v >= 0.0));

        let other = generate_seasonal_demand(&DemandParams {
            seed: 7,
            ..params
        })
        .unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn noiseless_pattern_is_exact() {
        let params = DemandParams {
            periods: 12,
            noise_std_dev: 0.0,
            ..DemandParams::default()
        };
        let series = generate_seasonal_demand(&params).unwrap();
        // t = 3: sin(π/2) = 1.
        assert!((series.values()[2] - (100.0 + 1.5 + 15.0)).abs() < 1e-9);
    }

    #[test]
    fn negative_values_are_clamped() {
        let params = DemandParams {
            base_level: -1000.0,
            ..DemandParams::default()
        };
        let series = generate_seasonal_demand(&params).unwrap();
        assert!(series.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn gaps_and_negative_demand_are_data_errors() {
        let gap = [
            DemandRecord {
                period: 1,
                demand: 5.0,
            },
            DemandRecord {
                period: 3,
                demand: 5.0,
            },
        ];
        assert!(matches!(
            DemandSeries::from_records(&gap),
            Err(Error::Data(_))
        ));
        assert!(matches!(
            DemandSeries::new(vec![1.0, -2.0]),
            Err(Error::Data(_))
        ));
        assert!(matches!(DemandSeries::new(vec![]), Err(Error::Data(_))));
        assert!(matches!(
            DemandSeries::new(vec![f64::NAN]),
            Err(Error::Data(_))
        ));
    }

    #[test]
    fn csv_round_trip() {
        let path = std::env::temp_dir().join(format!("demand_{}.csv", std::process::id()));
        let series = generate_seasonal_demand(&DemandParams::default()).unwrap();
        series.save(&path).unwrap();
        let loaded = DemandSeries::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, series);
    }

    #[test]
    fn malformed_file_is_a_data_error() {
        let path = std::env::temp_dir().join(format!("bad_demand_{}.csv", std::process::id()));
        std::fs::write(&path, "period,demand\n1,abc\n").unwrap();
        let result = DemandSeries::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(Error::Data(_))));
    }

    #[test]
    fn missing_file_is_a_data_error() {
        let path = std::env::temp_dir().join("no_such_demand_history.csv");
        assert!(matches!(DemandSeries::load(&path), Err(Error::Data(_))));
    }

    #[test]
    fn constant_demand_helper() {
        let series = generate_constant_demand(4, 8.0).unwrap();
        assert_eq!(series.values(), &[8.0; 4]);
    }
}
