// src/strategy/smoothing.rs

//! Additive Holt-Winters (ETS with additive trend and additive seasonality).
//!
//! ```text
//! Fitted:   F_t = L_{t-1} + T_{t-1} + S_{t mod m}
//! Level:    L_t = α (y_t − S_{t mod m}) + (1 − α)(L_{t-1} + T_{t-1})
//! Trend:    T_t = β (L_t − L_{t-1}) + (1 − β) T_{t-1}
//! Season:   S_{t mod m} ← γ (y_t − L_t) + (1 − γ) S_{t mod m}
//! ```
//!
//! Initial states come from the first two seasons; α, β, γ are chosen by a
//! bounded simplex search on the in-sample sum of squared errors.

use crate::error::{Error, Result};
use crate::strategy::optimization::{nelder_mead, SimplexOptions};
use crate::strategy::traits::{ensure_history, FittedModel, StatisticalModel};

#[derive(Debug, Clone)]
pub struct HoltWinters {
    season_length: usize,
}

/// Smoothing constants in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

struct Pass {
    fitted: Vec<f64>,
    sse: f64,
    forecast: f64,
}

impl HoltWinters {
    /// # Errors
    /// `Config` when the season is shorter than two periods.
    pub fn new(season_length: usize) -> Result<Self> {
        if season_length < 2 {
            return Err(Error::config(format!(
                "seasonal smoothing needs a season of at least 2 periods, got {season_length}"
            )));
        }
        Ok(Self { season_length })
    }

    pub fn season_length(&self) -> usize {
        self.season_length
    }

    fn run(&self, values: &[f64], params: SmoothingParams) -> Pass {
        let m = self.season_length;
        let mean1 = values[..m].iter().sum::<f64>() / m as f64;
        let mean2 = values[m..2 * m].iter().sum::<f64>() / m as f64;

        let mut level = mean1;
        let mut trend = (mean2 - mean1) / m as f64;
        let mut seasonals: Vec<f64> = values[..m].iter().map(|y| y - mean1).collect();

        let SmoothingParams { alpha, beta, gamma } = params;
        let mut fitted = Vec::with_capacity(values.len());
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate() {
            let idx = t % m;
            let prev_level = level;
            let prev_season = seasonals[idx];

            let forecast = prev_level + trend + prev_season;
            let e = y - forecast;
            sse += e * e;
            fitted.push(forecast);

            level = alpha * (y - prev_season) + (1.0 - alpha) * (prev_level + trend);
            trend = beta * (level - prev_level) + (1.0 - beta) * trend;
            seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * prev_season;
        }

        let forecast = level + trend + seasonals[values.len() % m];
        Pass {
            fitted,
            sse,
            forecast,
        }
    }

    /// Estimates α, β, γ on `values`.
    pub fn estimate(&self, values: &[f64]) -> Result<SmoothingParams> {
        ensure_history(values, self.min_history())?;
        let objective = |x: &[f64]| {
            self.run(
                values,
                SmoothingParams {
                    alpha: x[0],
                    beta: x[1],
                    gamma: x[2],
                },
            )
            .sse
        };
        let min = nelder_mead(
            objective,
            &[0.5, 0.1, 0.1],
            &[(0.0, 1.0); 3],
            &SimplexOptions::default(),
        )?;
        Ok(SmoothingParams {
            alpha: min.params[0],
            beta: min.params[1],
            gamma: min.params[2],
        })
    }
}

impl StatisticalModel for HoltWinters {
    fn kind(&self) -> &str {
        "ETS"
    }

    fn min_history(&self) -> usize {
        2 * self.season_length
    }

    fn fit(&self, history: &[f64]) -> Result<FittedModel> {
        let params = self.estimate(history)?;
        let pass = self.run(history, params);
        if !pass.sse.is_finite() {
            return Err(Error::numeric("ETS fit diverged"));
        }
        Ok(FittedModel {
            fitted: pass.fitted,
            forecast: pass.forecast,
        })
    }
}
