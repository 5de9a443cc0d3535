//! Stock Forecast Engine
//!
//! Forecasts near-term closing prices from daily OHLCV history and compares
//! regression algorithms on a walk-forward backtest.
//!
//! ## Architecture
//!
//! ```text
//! HistoricalDataProvider → Feature Extractor ⇉ Batch Mapper (rayon)
//!                                                  ↓
//!                 ArtifactStore ⇄ Model Bank (linear | forest | svm | ensemble)
//!                                                  ↓
//!                             Forecaster (self-feeding)   Comparator (walk-forward)
//!                                                  ↓
//!                                     ForecastEngine → CLI (JSON)
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod ml;
pub mod sentiment;
pub mod store;
pub mod types;

pub use engine::{ForecastEngine, ModelMetrics, PredictionBundle};
pub use error::{ForecastError, Result};

#[cfg(test)]
mod types_tests;
#[cfg(test)]
mod config_tests;
