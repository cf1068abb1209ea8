// src/strategy/arima.rs

//! ARIMA(1,1,1) without drift, estimated by conditional sum of squares.
//!
//! On the differenced series `w_t = y_t − y_{t-1}`:
//!
//! ```text
//! w_t = φ w_{t-1} + e_t + θ e_{t-1}
//! ```
//!
//! with pre-sample `w` and `e` set to zero.

use crate::error::{Error, Result};
use crate::strategy::optimization::{nelder_mead, SimplexOptions};
use crate::strategy::traits::{ensure_history, FittedModel, StatisticalModel};

/// Keeps the AR and MA parts inside the stationary/invertible region.
const COEFFICIENT_BOUND: f64 = 0.99;

#[derive(Debug, Clone, Default)]
pub struct Arima111;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmaParams {
    pub phi: f64,
    pub theta: f64,
}

struct Pass {
    /// One-step predictions of the differences, aligned with `diffs`.
    predicted: Vec<f64>,
    css: f64,
    next: f64,
}

impl Arima111 {
    pub fn new() -> Self {
        Self
    }

    fn run(diffs: &[f64], params: ArmaParams) -> Pass {
        let ArmaParams { phi, theta } = params;
        let mut prev_w = 0.0;
        let mut prev_e = 0.0;
        let mut css = 0.0;
        let mut predicted = Vec::with_capacity(diffs.len());

        for &w in diffs {
            let pred = phi * prev_w + theta * prev_e;
            let e = w - pred;
            css += e * e;
            predicted.push(pred);
            prev_w = w;
            prev_e = e;
        }

        Pass {
            predicted,
            css,
            next: phi * prev_w + theta * prev_e,
        }
    }

    pub fn estimate(&self, history: &[f64]) -> Result<ArmaParams> {
        ensure_history(history, self.min_history())?;
        let diffs = differences(history);
        let objective = |x: &[f64]| {
            Self::run(
                &diffs,
                ArmaParams {
                    phi: x[0],
                    theta: x[1],
                },
            )
            .css
        };
        let min = nelder_mead(
            objective,
            &[0.1, 0.1],
            &[(-COEFFICIENT_BOUND, COEFFICIENT_BOUND); 2],
            &SimplexOptions::default(),
        )?;
        Ok(ArmaParams {
            phi: min.params[0],
            theta: min.params[1],
        })
    }
}

fn differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

impl StatisticalModel for Arima111 {
    fn kind(&self) -> &str {
        "ARIMA"
    }

    fn min_history(&self) -> usize {
        3
    }

    fn fit(&self, history: &[f64]) -> Result<FittedModel> {
        let params = self.estimate(history)?;
        let diffs = differences(history);
        let pass = Self::run(&diffs, params);
        if !pass.css.is_finite() {
            return Err(Error::numeric("ARIMA fit diverged"));
        }

        // Level 0 has no previous observation; it is fitted by itself.
        let mut fitted = Vec::with_capacity(history.len());
        fitted.push(history[0]);
        for (t, pred) in pass.predicted.iter().enumerate() {
            fitted.push(history[t] + pred);
        }

        Ok(FittedModel {
            fitted,
            forecast: history[history.len() - 1] + pass.next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn fitted_values_align_with_history() {
        let data = [10.0, 12.0, 11.0, 13.0, 12.5, 14.0];
        let fit = Arima111::new().fit(&data).unwrap();
        assert_eq!(fit.fitted.len(), data.len());
        assert_eq!(fit.fitted[0], data[0]);
        assert!(fit.forecast.is_finite());
    }

    #[test]
    fn constant_series_forecasts_itself() {
        let fit = Arima111::new().fit(&[7.0; 10]).unwrap();
        assert_abs_diff_eq!(fit.forecast, 7.0, epsilon = 1e-12);
        for f in &fit.fitted {
            assert_abs_diff_eq!(*f, 7.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn persistent_differences_push_the_forecast_up() {
        let data: Vec<f64> = (0..30).map(|t| 50.0 + 3.0 * t as f64).collect();
        let params = Arima111::new().estimate(&data).unwrap();
        assert!(params.phi > 0.5, "phi = {}", params.phi);
        let fit = Arima111::new().fit(&data).unwrap();
        assert!(fit.forecast > data[data.len() - 1]);
    }

    #[test]
    fn coefficients_stay_in_bounds() {
        let data = [1.0, 5.0, 2.0, 6.0, 1.0, 7.0, 0.5, 8.0];
        let params = Arima111::new().estimate(&data).unwrap();
        assert!(params.phi.abs() <= COEFFICIENT_BOUND);
        assert!(params.theta.abs() <= COEFFICIENT_BOUND);
    }

    #[test]
    fn too_short_history_is_rejected() {
        assert!(matches!(
            Arima111::new().fit(&[1.0, 2.0]),
            Err(Error::InsufficientHistory { required: 3, .. })
        ));
    }
}
