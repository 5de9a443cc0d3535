//! Configuration
//!
//! Loaded from an optional TOML file, then overridden by `FORECAST__*`
//! environment variables (e.g. `FORECAST__ENGINE__WORKERS=8`).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default)]
    pub kernel: KernelConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub data: DataConfig,
}

impl Config {
    /// Load config from file (if present) and environment
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::new(path, config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix("FORECAST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Where the prediction bundle's accuracy/confidence figures come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSource {
    /// Randomised figures in a plausible band, not measured
    #[default]
    Placeholder,
    /// Measured on the held-out split of the last training run
    Holdout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker threads for parallel feature extraction
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Overlap chunks by the lookback so chunking loses no rows
    #[serde(default = "default_true")]
    pub preserve_chunk_lookback: bool,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: usize,
    /// Years of history fetched for training and comparison
    #[serde(default = "default_train_years")]
    pub train_years: u32,
    /// Years of history fetched for prediction
    #[serde(default = "default_predict_years")]
    pub predict_years: u32,
    #[serde(default)]
    pub metrics_source: MetricsSource,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            preserve_chunk_lookback: true,
            horizon_days: default_horizon_days(),
            train_years: default_train_years(),
            predict_years: default_predict_years(),
            metrics_source: MetricsSource::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Minimum usable feature rows before a fit is attempted
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_seed")]
    pub split_seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_rows: default_min_rows(),
            test_fraction: default_test_fraction(),
            split_seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    /// None grows trees until leaves are pure
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Box constraint (regularization strength)
    #[serde(default = "default_c")]
    pub c: f64,
    /// RBF kernel coefficient
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// Width of the insensitive tube
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_tol")]
    pub tol: f64,
    #[serde(default = "default_max_epochs")]
    pub max_epochs: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            c: default_c(),
            gamma: default_gamma(),
            epsilon: default_epsilon(),
            tol: default_tol(),
            max_epochs: default_max_epochs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Trailing rows held out and replayed day by day
    #[serde(default = "default_holdout_days")]
    pub holdout_days: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            holdout_days: default_holdout_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding `<SYMBOL>.csv` daily history files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    4
}

fn default_horizon_days() -> usize {
    30
}

fn default_train_years() -> u32 {
    2
}

fn default_predict_years() -> u32 {
    1
}

fn default_min_rows() -> usize {
    10
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_n_trees() -> usize {
    100
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_c() -> f64 {
    100.0
}

fn default_gamma() -> f64 {
    0.1
}

fn default_epsilon() -> f64 {
    0.1
}

fn default_tol() -> f64 {
    1e-3
}

fn default_max_epochs() -> usize {
    1000
}

fn default_holdout_days() -> usize {
    30
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
