//! Error types for the forecasting engine
//!
//! Internals propagate `ForecastError` with `?`. Component boundaries turn
//! these into absence signals (`None`, skipped outcomes) after logging.

use thiserror::Error;

/// Engine-wide error type
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Insufficient data for {stage}: need at least {required} rows, got {actual}")]
    InsufficientData {
        stage: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Data fetch failed: {0}")]
    Fetch(String),

    #[error("Model failure: {0}")]
    Model(String),

    #[error("Artifact persistence failed: {0}")]
    Persistence(String),

    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ForecastError {
    /// True for the "not enough rows" family, which callers treat as a
    /// quiet absence rather than a fault.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, ForecastError::InsufficientData { .. })
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
