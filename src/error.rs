// src/error.rs

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the forecasting and simulation pipeline can report.
///
/// `Config` and `Data` errors are fatal to the run that raised them.
/// `InsufficientHistory` and `Numeric` errors are fatal to a single forecast
/// or grid cell; the sensitivity sweep records them as flagged rows and keeps
/// going.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid policy or strategy parameter (negative cost, z < 0, window 0, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// A forecast was requested against a history that is too short.
    #[error("insufficient history: need at least {required} observations, got {provided}")]
    InsufficientHistory { required: usize, provided: usize },

    /// Arithmetic breakdown: zero divisor, non-finite value, fit did not converge.
    #[error("numeric error: {0}")]
    Numeric(String),

    /// Missing or malformed input series.
    #[error("data error: {0}")]
    Data(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn numeric(message: impl Into<String>) -> Self {
        Self::Numeric(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    /// Errors that are isolated to one strategy or grid cell rather than
    /// aborting the whole run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientHistory { .. } | Self::Numeric(_))
    }
}
