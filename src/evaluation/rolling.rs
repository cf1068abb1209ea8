// src/evaluation/rolling.rs

//! Rolling-origin (walk-forward) backtest.
//!
//! For every period `t` of the evaluation window the strategy sees only
//! `demand[0..t]`, forecasts period `t`, and the error against the realised
//! demand is scored with MAE, RMSE and MAPE.

use crate::error::{Error, Result};
use crate::strategy::traits::ForecastStrategy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One out-of-sample forecast and the demand it was scored against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// 1-based period number.
    pub period: usize,
    pub forecast: f64,
    pub actual: f64,
}

/// Error metrics over an evaluation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    pub mae: f64,
    pub rmse: f64,
    /// Percent. `None` when every actual in the window was zero.
    pub mape: Option<f64>,
    /// Points left out of MAPE because their actual demand was zero.
    pub mape_excluded: usize,
    pub points: usize,
}

/// Scores a set of forecast points.
///
/// Zero actuals make the percentage error undefined; such points still count
/// towards MAE and RMSE but are dropped from MAPE and reported in
/// `mape_excluded`.
///
/// # Errors
/// `InsufficientHistory` for an empty set, `Numeric` for non-finite values.
pub fn accuracy(points: &[ForecastPoint]) -> Result<ForecastAccuracy> {
    if points.is_empty() {
        return Err(Error::InsufficientHistory {
            required: 1,
            provided: 0,
        });
    }
    if let Some(p) = points
        .iter()
        .find(|p| !p.forecast.is_finite() || !p.actual.is_finite())
    {
        return Err(Error::numeric(format!(
            "non-finite forecast or actual in period {}",
            p.period
        )));
    }

    let n = points.len() as f64;
    let mae = points.iter().map(|p| (p.actual - p.forecast).abs()).sum::<f64>() / n;
    let mse = points
        .iter()
        .map(|p| (p.actual - p.forecast).powi(2))
        .sum::<f64>()
        / n;

    let percentage: Vec<f64> = points
        .iter()
        .filter(|p| p.actual != 0.0)
        .map(|p| ((p.actual - p.forecast) / p.actual).abs())
        .collect();
    let mape_excluded = points.len() - percentage.len();
    if mape_excluded > 0 {
        warn!(
            excluded = mape_excluded,
            "zero demand in evaluation window, points left out of MAPE"
        );
    }
    let mape = if percentage.is_empty() {
        None
    } else {
        Some(percentage.iter().sum::<f64>() / percentage.len() as f64 * 100.0)
    };

    Ok(ForecastAccuracy {
        mae,
        rmse: mse.sqrt(),
        mape,
        mape_excluded,
        points: points.len(),
    })
}

/// Evaluation table row. Metrics are `None` when the strategy failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    pub strategy: String,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    pub mape: Option<f64>,
    pub mape_excluded: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RollingOriginEvaluator {
    horizon: usize,
}

impl Default for RollingOriginEvaluator {
    /// The last twelve periods.
    fn default() -> Self {
        Self { horizon: 12 }
    }
}

impl RollingOriginEvaluator {
    /// # Errors
    /// `Config` when `horizon` is zero.
    pub fn new(horizon: usize) -> Result<Self> {
        if horizon == 0 {
            return Err(Error::config("evaluation horizon must be positive"));
        }
        Ok(Self { horizon })
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// First evaluated index `s = T − horizon`. At least one observation
    /// must precede it.
    pub fn start_index(&self, len: usize) -> Result<usize> {
        if len <= self.horizon {
            return Err(Error::InsufficientHistory {
                required: self.horizon + 1,
                provided: len,
            });
        }
        Ok(len - self.horizon)
    }

    /// Walk-forward forecasts over the evaluation window.
    pub fn backtest(
        &self,
        series: &[f64],
        strategy: &dyn ForecastStrategy,
    ) -> Result<Vec<ForecastPoint>> {
        let start = self.start_index(series.len())?;
        (start..series.len())
            .map(|t| {
                let forecast = strategy.forecast_next(&series[..t])?;
                Ok(ForecastPoint {
                    period: t + 1,
                    forecast,
                    actual: series[t],
                })
            })
            .collect()
    }

    pub fn evaluate(
        &self,
        series: &[f64],
        strategy: &dyn ForecastStrategy,
    ) -> Result<ForecastAccuracy> {
        let points = self.backtest(series, strategy)?;
        accuracy(&points)
    }

    /// Evaluates each strategy independently. A strategy that runs into a
    /// numeric or history problem gets a flagged row; configuration and data
    /// errors abort.
    pub fn evaluate_all(
        &self,
        series: &[f64],
        strategies: &[Box<dyn ForecastStrategy>],
    ) -> Result<Vec<EvaluationRow>> {
        strategies
            .iter()
            .map(|strategy| {
                let name = strategy.name().to_string();
                match self.evaluate(series, strategy.as_ref()) {
                    Ok(acc) => {
                        debug!(strategy = %name, mae = acc.mae, rmse = acc.rmse, "evaluated");
                        Ok(EvaluationRow {
                            strategy: name,
                            mae: Some(acc.mae),
                            rmse: Some(acc.rmse),
                            mape: acc.mape,
                            mape_excluded: acc.mape_excluded,
                            error: None,
                        })
                    }
                    Err(e) if e.is_recoverable() => {
                        warn!(strategy = %name, error = %e, "evaluation failed");
                        Ok(EvaluationRow {
                            strategy: name,
                            mae: None,
                            rmse: None,
                            mape: None,
                            mape_excluded: 0,
                            error: Some(e.to_string()),
                        })
                    }
                    Err(e) => Err(e),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::implementations::{MovingAverage, NaiveForecast, StrategySpec};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn metrics_on_a_small_window() {
        let points = [
            ForecastPoint {
                period: 1,
                forecast: 8.0,
                actual: 10.0,
            },
            ForecastPoint {
                period: 2,
                forecast: 24.0,
                actual: 20.0,
            },
        ];
        let acc = accuracy(&points).unwrap();
        assert_abs_diff_eq!(acc.mae, 3.0);
        assert_abs_diff_eq!(acc.rmse, 10.0f64.sqrt());
        assert_abs_diff_eq!(acc.mape.unwrap(), 20.0);
        assert_eq!(acc.mape_excluded, 0);
    }

    #[test]
    fn zero_actuals_are_left_out_of_mape_only() {
        let points = [
            ForecastPoint {
                period: 1,
                forecast: 5.0,
                actual: 0.0,
            },
            ForecastPoint {
                period: 2,
                forecast: 9.0,
                actual: 10.0,
            },
        ];
        let acc = accuracy(&points).unwrap();
        assert_abs_diff_eq!(acc.mae, 3.0);
        assert_abs_diff_eq!(acc.mape.unwrap(), 10.0);
        assert_eq!(acc.mape_excluded, 1);

        let all_zero = [ForecastPoint {
            period: 1,
            forecast: 1.0,
            actual: 0.0,
        }];
        assert_eq!(accuracy(&all_zero).unwrap().mape, None);
    }

    #[test]
    fn window_covers_the_last_periods() {
        let series: Vec<f64> = (1..=20).map(f64::from).collect();
        let evaluator = RollingOriginEvaluator::default();
        let points = evaluator.backtest(&series, &NaiveForecast::new()).unwrap();
        assert_eq!(points.len(), 12);
        assert_eq!(points[0].period, 9);
        // Naive on a unit ramp is always one short.
        assert!(points.iter().all(|p| p.actual - p.forecast == 1.0));
        let acc = evaluator.evaluate(&series, &NaiveForecast::new()).unwrap();
        assert_abs_diff_eq!(acc.mae, 1.0);
        assert_abs_diff_eq!(acc.rmse, 1.0);
    }

    #[test]
    fn series_no_longer_than_horizon_is_rejected() {
        let evaluator = RollingOriginEvaluator::default();
        let err = evaluator.evaluate(&[1.0; 12], &NaiveForecast::new());
        assert!(matches!(
            err,
            Err(Error::InsufficientHistory {
                required: 13,
                provided: 12
            })
        ));
        assert!(RollingOriginEvaluator::new(0).is_err());
    }

    #[test]
    fn failing_strategy_gets_a_flagged_row() {
        let series: Vec<f64> = (0..20).map(|t| 100.0 + t as f64).collect();
        let strategies = vec![
            StrategySpec::Naive.build().unwrap(),
            StrategySpec::Ets { season_length: 12 }.build().unwrap(),
        ];
        let rows = RollingOriginEvaluator::new(4)
            .unwrap()
            .evaluate_all(&series, &strategies)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].error.is_none());
        assert!(rows[1].mae.is_none());
        assert!(rows[1].error.is_some());
    }

    proptest! {
        #[test]
        fn forecasts_ignore_the_future(
            series in prop::collection::vec(0.0f64..500.0, 2..40),
            cut in 1usize..39,
            noise in 0.0f64..1000.0,
            window in 1usize..6,
        ) {
            let cut = cut.min(series.len() - 1);
            let strategies: Vec<Box<dyn ForecastStrategy>> = vec![
                Box::new(NaiveForecast::new()),
                Box::new(MovingAverage::new(window).unwrap()),
                StrategySpec::Arima.build().unwrap(),
            ];
            let mut mutated = series.clone();
            for v in mutated.iter_mut().skip(cut) {
                *v += noise;
            }
            for strategy in &strategies {
                let before = strategy.forecast_next(&series[..cut]);
                let after = strategy.forecast_next(&mutated[..cut]);
                match (before, after) {
                    (Ok(a), Ok(b)) => prop_assert_eq!(a.to_bits(), b.to_bits()),
                    (Err(_), Err(_)) => {}
                    _ => prop_assert!(false, "outcome changed for {}", strategy.name()),
                }
            }
        }
    }
}
