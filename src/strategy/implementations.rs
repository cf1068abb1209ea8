// src/strategy/implementations.rs

use crate::error::{Error, Result};
use crate::strategy::arima::Arima111;
use crate::strategy::smoothing::HoltWinters;
use crate::strategy::traits::{ensure_history, ForecastStrategy, StatisticalModel};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// =========================================================================
// 1. Naive Forecast
// =========================================================================

/// "Tomorrow looks like today": the forecast is the last observation.
#[derive(Debug, Clone, Default)]
pub struct NaiveForecast;

impl NaiveForecast {
    pub fn new() -> Self {
        Self
    }
}

impl ForecastStrategy for NaiveForecast {
    fn name(&self) -> &str {
        "Naive"
    }

    fn forecast_next(&self, history: &[f64]) -> Result<f64> {
        ensure_history(history, 1)?;
        Ok(history[history.len() - 1])
    }
}

// =========================================================================
// 2. Moving Average
// =========================================================================

/// Mean of the last `window` observations. Short histories fall back to the
/// mean of everything seen so far.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
}

impl MovingAverage {
    /// # Errors
    /// `Config` when `window` is zero.
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(Error::config("moving average window must be positive"));
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl ForecastStrategy for MovingAverage {
    fn name(&self) -> &str {
        "Moving Average"
    }

    fn forecast_next(&self, history: &[f64]) -> Result<f64> {
        ensure_history(history, 1)?;
        let start = history.len().saturating_sub(self.window);
        Ok(mean(&history[start..]))
    }
}

// =========================================================================
// 3. Statistical Model
// =========================================================================

/// Adapter that puts an estimation backend behind the strategy contract.
///
/// `forecast_next` refits on the causal history every call. `fit_in_sample`
/// returns the backend's own fitted values from a single fit on the whole
/// series; those values can depend on observations after the period they
/// describe (initial states, smoothing parameters), so they are an in-sample
/// proxy rather than a true walk-forward forecast.
#[derive(Debug)]
pub struct StatisticalStrategy {
    label: String,
    model: Box<dyn StatisticalModel>,
}

impl StatisticalStrategy {
    pub fn new(label: impl Into<String>, model: Box<dyn StatisticalModel>) -> Self {
        Self {
            label: label.into(),
            model,
        }
    }

    pub fn model(&self) -> &dyn StatisticalModel {
        self.model.as_ref()
    }
}

impl ForecastStrategy for StatisticalStrategy {
    fn name(&self) -> &str {
        &self.label
    }

    fn forecast_next(&self, history: &[f64]) -> Result<f64> {
        ensure_history(history, self.model.min_history())?;
        let fit = self.model.fit(history)?;
        if !fit.forecast.is_finite() {
            return Err(Error::numeric(format!(
                "{} produced a non-finite forecast",
                self.model.kind()
            )));
        }
        Ok(fit.forecast)
    }

    fn fit_in_sample(&self, series: &[f64]) -> Result<Vec<f64>> {
        ensure_history(series, self.model.min_history())?;
        let fit = self.model.fit(series)?;
        if fit.fitted.len() != series.len() {
            return Err(Error::numeric(format!(
                "{} returned {} fitted values for {} observations",
                self.model.kind(),
                fit.fitted.len(),
                series.len()
            )));
        }
        if fit.fitted.iter().any(|v| !v.is_finite()) {
            return Err(Error::numeric(format!(
                "{} produced non-finite fitted values",
                self.model.kind()
            )));
        }
        debug!(
            model = self.model.kind(),
            periods = series.len(),
            "fitted values from a full-history fit, not walk-forward"
        );
        Ok(fit.fitted)
    }
}

// =========================================================================
// Configuration
// =========================================================================

/// Serializable description of a strategy, as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategySpec {
    Naive,
    MovingAverage {
        #[serde(default = "default_window")]
        window: i64,
    },
    Ets {
        #[serde(default = "default_season_length")]
        season_length: usize,
    },
    Arima,
}

fn default_window() -> i64 {
    3
}

fn default_season_length() -> usize {
    12
}

impl StrategySpec {
    /// The four strategies compared by default.
    pub fn defaults() -> Vec<StrategySpec> {
        vec![
            StrategySpec::Naive,
            StrategySpec::MovingAverage {
                window: default_window(),
            },
            StrategySpec::Ets {
                season_length: default_season_length(),
            },
            StrategySpec::Arima,
        ]
    }

    /// # Errors
    /// `Config` for a non-positive window or season length.
    pub fn build(&self) -> Result<Box<dyn ForecastStrategy>> {
        Ok(match self {
            StrategySpec::Naive => Box::new(NaiveForecast::new()),
            StrategySpec::MovingAverage { window } => {
                let window = usize::try_from(*window).map_err(|_| {
                    Error::config(format!(
                        "moving average window must be positive, got {window}"
                    ))
                })?;
                Box::new(MovingAverage::new(window)?)
            }
            StrategySpec::Ets { season_length } => Box::new(StatisticalStrategy::new(
                "ETS",
                Box::new(HoltWinters::new(*season_length)?),
            )),
            StrategySpec::Arima => {
                Box::new(StatisticalStrategy::new("ARIMA", Box::new(Arima111::new())))
            }
        })
    }
}

/// Builds every configured strategy, failing on the first invalid one.
pub fn build_strategies(specs: &[StrategySpec]) -> Result<Vec<Box<dyn ForecastStrategy>>> {
    specs.iter().map(StrategySpec::build).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::traits::FittedModel;
    use approx::assert_abs_diff_eq;

    #[test]
    fn naive_returns_last_observation() {
        let naive = NaiveForecast::new();
        assert_eq!(naive.forecast_next(&[3.0, 7.0, 5.0]).unwrap(), 5.0);
    }

    #[test]
    fn empty_history_is_rejected() {
        let naive = NaiveForecast::new();
        let ma = MovingAverage::new(3).unwrap();
        assert!(matches!(
            naive.forecast_next(&[]),
            Err(Error::InsufficientHistory { provided: 0, .. })
        ));
        assert!(matches!(
            ma.forecast_next(&[]),
            Err(Error::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn moving_average_boundary() {
        let ma = MovingAverage::new(3).unwrap();
        // Shorter than the window: whole-history mean.
        assert_abs_diff_eq!(ma.forecast_next(&[2.0, 4.0]).unwrap(), 3.0);
        // Exactly the window.
        assert_abs_diff_eq!(ma.forecast_next(&[2.0, 4.0, 6.0]).unwrap(), 4.0);
        // Longer: last three only.
        assert_abs_diff_eq!(ma.forecast_next(&[100.0, 2.0, 4.0, 6.0]).unwrap(), 4.0);
    }

    #[test]
    fn zero_window_is_a_config_error() {
        assert!(matches!(MovingAverage::new(0), Err(Error::Config(_))));
        let spec = StrategySpec::MovingAverage { window: -2 };
        assert!(matches!(spec.build(), Err(Error::Config(_))));
    }

    #[test]
    fn in_sample_first_value_is_the_first_observation() {
        let naive = NaiveForecast::new();
        let fitted = naive.fit_in_sample(&[10.0, 12.0, 11.0]).unwrap();
        assert_eq!(fitted, vec![10.0, 10.0, 12.0]);

        let ma = MovingAverage::new(2).unwrap();
        let fitted = ma.fit_in_sample(&[10.0, 12.0, 14.0, 20.0]).unwrap();
        assert_eq!(fitted, vec![10.0, 10.0, 11.0, 13.0]);
    }

    #[test]
    fn in_sample_of_empty_series_fails() {
        assert!(NaiveForecast::new().fit_in_sample(&[]).is_err());
    }

    #[derive(Debug)]
    struct Broken;

    impl StatisticalModel for Broken {
        fn kind(&self) -> &str {
            "broken"
        }
        fn min_history(&self) -> usize {
            2
        }
        fn fit(&self, history: &[f64]) -> Result<FittedModel> {
            Ok(FittedModel {
                fitted: vec![f64::NAN; history.len()],
                forecast: f64::INFINITY,
            })
        }
    }

    #[test]
    fn statistical_adapter_flags_non_finite_output() {
        let strategy = StatisticalStrategy::new("Broken", Box::new(Broken));
        assert!(matches!(
            strategy.forecast_next(&[1.0, 2.0]),
            Err(Error::Numeric(_))
        ));
        assert!(matches!(
            strategy.fit_in_sample(&[1.0, 2.0]),
            Err(Error::Numeric(_))
        ));
        assert!(matches!(
            strategy.forecast_next(&[1.0]),
            Err(Error::InsufficientHistory { required: 2, .. })
        ));
    }

    #[test]
    fn default_specs_build_the_standard_lineup() {
        let strategies = build_strategies(&StrategySpec::defaults()).unwrap();
        let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Naive", "Moving Average", "ETS", "ARIMA"]);
    }

    #[test]
    fn specs_parse_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategies: Vec<StrategySpec>,
        }
        let text = r#"
            [[strategies]]
            kind = "naive"

            [[strategies]]
            kind = "moving_average"
            window = 5

            [[strategies]]
            kind = "ets"
        "#;
        let parsed: Wrapper = toml::from_str(text).unwrap();
        assert_eq!(
            parsed.strategies,
            vec![
                StrategySpec::Naive,
                StrategySpec::MovingAverage { window: 5 },
                StrategySpec::Ets { season_length: 12 },
            ]
        );
    }
}
