pub mod rolling;

pub use rolling::{accuracy, EvaluationRow, ForecastAccuracy, ForecastPoint, RollingOriginEvaluator};
