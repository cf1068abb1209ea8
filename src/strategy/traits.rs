// src/strategy/traits.rs

use crate::error::{Error, Result};
use std::fmt::Debug;

/// A demand forecasting rule.
///
/// Implementations hold configuration only. Nothing is carried between calls,
/// so the same strategy can be shared by the evaluator and every cell of the
/// sensitivity grid.
///
/// We require `Send` + `Sync` so grid cells can be farmed out to workers.
pub trait ForecastStrategy: Debug + Send + Sync {
    /// Display name used as the row key in every report.
    fn name(&self) -> &str;

    /// One-step-ahead forecast from `history` (all periods strictly before
    /// the target period).
    ///
    /// # Errors
    /// `InsufficientHistory` when `history` is empty or shorter than the
    /// strategy needs. The strategy never fabricates a value.
    fn forecast_next(&self, history: &[f64]) -> Result<f64>;

    /// Forecast sequence aligned 1:1 with `series`, used to drive the
    /// inventory simulator.
    ///
    /// The default walks growing causal prefixes. Element 0 has no history,
    /// so it is defined as `series[0]` itself: the policy "knows" the first
    /// demand.
    fn fit_in_sample(&self, series: &[f64]) -> Result<Vec<f64>> {
        let first = *series.first().ok_or(Error::InsufficientHistory {
            required: 1,
            provided: 0,
        })?;

        let mut fitted = Vec::with_capacity(series.len());
        fitted.push(first);
        for t in 1..series.len() {
            fitted.push(self.forecast_next(&series[..t])?);
        }
        Ok(fitted)
    }
}

/// Output of one statistical model fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    /// In-sample one-step fitted values, aligned with the fitted history.
    pub fitted: Vec<f64>,
    /// Forecast for the period right after the history.
    pub forecast: f64,
}

/// Estimation backend for a statistical forecasting model (ETS, ARIMA, ...).
///
/// The pipeline treats the estimator as opaque: it hands over a history and
/// gets back fitted values plus the next forecast. Parameters are re-estimated
/// on every call.
pub trait StatisticalModel: Debug + Send + Sync {
    /// Short model label, e.g. "ETS" or "ARIMA".
    fn kind(&self) -> &str;

    /// Smallest history the estimator accepts.
    fn min_history(&self) -> usize;

    /// Estimate the model on `history`.
    fn fit(&self, history: &[f64]) -> Result<FittedModel>;
}

/// Rejects histories shorter than `required`.
pub fn ensure_history(history: &[f64], required: usize) -> Result<()> {
    if history.len() < required.max(1) {
        return Err(Error::InsufficientHistory {
            required: required.max(1),
            provided: history.len(),
        });
    }
    Ok(())
}
