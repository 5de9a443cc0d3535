//! Price forecasting models
//!
//! - Feature extraction from trailing OHLCV windows
//! - Parallel chunked batch extraction
//! - Linear, random forest and kernel regressors behind one trait
//! - Model bank with scaler fitting and artifact persistence
//! - Self-feeding multi-day forecaster
//! - Walk-forward comparator

pub mod backtest;
pub mod bank;
pub mod features;
pub mod forecaster;
pub mod mapper;
pub mod regressors;
pub mod scaler;


pub use backtest::{AlgorithmOutcome, Comparator, ComparisonRecord, ComparisonReport, SkipReason};
pub use bank::{ModelBank, TrainedModels, TrainingReport};
pub use features::{extract_batch, features_at, latest_features, FeatureSet, FeatureVector};
pub use forecaster::{roll_forward, Forecast, Forecaster};
pub use mapper::BatchMapper;
pub use regressors::{RegressionModel, Regressor};
pub use scaler::StandardScaler;
