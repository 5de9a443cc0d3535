//! Core data types shared across the engine

use crate::error::ForecastError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbols name files on disk, so anything that could leave the target
/// directory is rejected
pub fn check_symbol(symbol: &str) -> Result<(), ForecastError> {
    let escapes = symbol.is_empty()
        || symbol == "."
        || symbol.contains("..")
        || symbol.contains(['/', '\\', '\0']);
    if escapes {
        return Err(ForecastError::InvalidSymbol(symbol.to_string()));
    }
    Ok(())
}

/// One trading session's OHLCV record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Synthetic bar built from a predicted close.
    ///
    /// High/low are a ±1% band around the prediction.
    pub fn synthetic(date: NaiveDate, price: f64, volume: f64) -> Self {
        Self {
            date,
            open: price,
            high: price * 1.01,
            low: price * 0.99,
            close: price,
            volume,
        }
    }
}

/// Date-ordered bar sequence for one symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Dates strictly increasing (gaps allowed)
    pub fn is_ordered(&self) -> bool {
        self.bars.windows(2).all(|w| w[0].date < w[1].date)
    }
}

/// Forecast output for one future day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Caller-selectable algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    LinearRegression,
    RandomForest,
    Svm,
    Ensemble,
}

impl Algorithm {
    /// Comparator order
    pub const ALL: [Algorithm; 4] = [
        Algorithm::LinearRegression,
        Algorithm::RandomForest,
        Algorithm::Svm,
        Algorithm::Ensemble,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::LinearRegression => "linear_regression",
            Algorithm::RandomForest => "random_forest",
            Algorithm::Svm => "svm",
            Algorithm::Ensemble => "ensemble",
        }
    }

    /// Regressor variants trained (and averaged) for this algorithm
    pub fn variants(&self) -> &'static [Variant] {
        match self {
            Algorithm::LinearRegression => &[Variant::Linear],
            Algorithm::RandomForest => &[Variant::RandomForest],
            Algorithm::Svm => &[Variant::Kernel],
            Algorithm::Ensemble => &[Variant::Linear, Variant::RandomForest, Variant::Kernel],
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear_regression" | "linear" => Ok(Algorithm::LinearRegression),
            "random_forest" | "rf" => Ok(Algorithm::RandomForest),
            "svm" | "svr" => Ok(Algorithm::Svm),
            "ensemble" => Ok(Algorithm::Ensemble),
            other => Err(ForecastError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Individual regressor in the model bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Linear,
    RandomForest,
    Kernel,
}

impl Variant {
    /// Artifact file stem
    pub fn stem(&self) -> &'static str {
        match self {
            Variant::Linear => "linear",
            Variant::RandomForest => "rf",
            Variant::Kernel => "svm",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}
