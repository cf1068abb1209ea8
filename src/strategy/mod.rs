pub mod arima;
pub mod implementations;
pub mod optimization;
pub mod smoothing;
pub mod traits;

pub use implementations::{
    build_strategies, MovingAverage, NaiveForecast, StatisticalStrategy, StrategySpec,
};
pub use traits::{FittedModel, ForecastStrategy, StatisticalModel};
