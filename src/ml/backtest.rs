//! Walk-forward comparison of the algorithms
//!
//! Every algorithm is retrained on all but the last `holdout_days` bars and
//! then replayed over the held-out days one at a time. Each day's features
//! come from the actual bars observed so far, never from predictions.

use super::bank::ModelBank;
use super::features::latest_features;
use crate::types::{Algorithm, Bar};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Why an algorithm has no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientHistory,
    TrainingFailed,
    PredictionFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::InsufficientHistory => "insufficient history",
            SkipReason::TrainingFailed => "training failed",
            SkipReason::PredictionFailed => "prediction failed",
        };
        f.write_str(s)
    }
}

/// Error metrics over the held-out window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub mae: f64,
    pub rmse: f64,
    /// Percent
    pub mape: f64,
    /// `100 - mape`
    pub accuracy: f64,
}

impl ComparisonRecord {
    /// Metrics for aligned actual/predicted closes, `None` if undefined
    pub fn from_predictions(actual: &[f64], predicted: &[f64]) -> Option<Self> {
        if actual.is_empty() || actual.len() != predicted.len() {
            return None;
        }
        let n = actual.len() as f64;
        let pairs = || actual.iter().zip(predicted.iter());

        let mae = pairs().map(|(a, p)| (a - p).abs()).sum::<f64>() / n;
        let rmse = (pairs().map(|(a, p)| (a - p).powi(2)).sum::<f64>() / n).sqrt();
        let mape = pairs().map(|(a, p)| ((a - p) / a).abs()).sum::<f64>() / n * 100.0;

        Some(Self {
            mae: round_to(mae, 4)?,
            rmse: round_to(rmse, 4)?,
            mape: round_to(mape, 4)?,
            accuracy: round_to(100.0 - mape, 2)?,
        })
    }
}

/// Round to `places` decimals through `Decimal` (ties to even); `None` for
/// non-finite input
pub(crate) fn round_to(value: f64, places: u32) -> Option<f64> {
    Decimal::from_f64(value)?.round_dp(places).to_f64()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlgorithmOutcome {
    Scored(ComparisonRecord),
    Skipped { reason: SkipReason },
}

impl AlgorithmOutcome {
    pub fn record(&self) -> Option<&ComparisonRecord> {
        match self {
            AlgorithmOutcome::Scored(record) => Some(record),
            AlgorithmOutcome::Skipped { .. } => None,
        }
    }
}

/// Outcome of every algorithm for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub symbol: String,
    pub outcomes: BTreeMap<Algorithm, AlgorithmOutcome>,
}

impl ComparisonReport {
    /// Every algorithm skipped for the same reason
    pub fn skipped_all(symbol: &str, reason: SkipReason) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            outcomes: Algorithm::ALL
                .iter()
                .map(|&a| (a, AlgorithmOutcome::Skipped { reason }))
                .collect(),
        }
    }

    /// Scored algorithms only
    pub fn records(&self) -> BTreeMap<Algorithm, ComparisonRecord> {
        self.outcomes
            .iter()
            .filter_map(|(a, o)| o.record().map(|r| (*a, *r)))
            .collect()
    }

    pub fn outcome(&self, algorithm: Algorithm) -> Option<&AlgorithmOutcome> {
        self.outcomes.get(&algorithm)
    }
}

pub struct Comparator {
    bank: Arc<ModelBank>,
    holdout_days: usize,
}

impl Comparator {
    pub fn new(bank: Arc<ModelBank>, holdout_days: usize) -> Self {
        Self {
            bank,
            holdout_days: holdout_days.max(1),
        }
    }

    pub fn holdout_days(&self) -> usize {
        self.holdout_days
    }

    /// Evaluate all algorithms independently; one failing never affects
    /// the others. Overwrites the stored models of each algorithm.
    pub fn compare(&self, symbol: &str, bars: &[Bar]) -> ComparisonReport {
        let outcomes = Algorithm::ALL
            .iter()
            .map(|&algorithm| {
                let outcome = self.evaluate(symbol, algorithm, bars);
                if let AlgorithmOutcome::Skipped { reason } = &outcome {
                    warn!("Skipping {} for {}: {}", algorithm, symbol, reason);
                }
                (algorithm, outcome)
            })
            .collect();

        ComparisonReport {
            symbol: symbol.to_uppercase(),
            outcomes,
        }
    }

    pub fn evaluate(&self, symbol: &str, algorithm: Algorithm, bars: &[Bar]) -> AlgorithmOutcome {
        let skip = |reason| AlgorithmOutcome::Skipped { reason };

        if bars.len() < self.holdout_days {
            return skip(SkipReason::InsufficientHistory);
        }
        let train_len = bars.len() - self.holdout_days;
        if train_len < self.bank.min_bars() {
            return skip(SkipReason::InsufficientHistory);
        }

        let Some((models, _)) = self.bank.train(symbol, algorithm, &bars[..train_len]) else {
            return skip(SkipReason::TrainingFailed);
        };

        let mut predicted = Vec::with_capacity(self.holdout_days);
        let mut actual = Vec::with_capacity(self.holdout_days);
        for day in train_len..bars.len() {
            let Some(features) = latest_features(&bars[..day]) else {
                return skip(SkipReason::PredictionFailed);
            };
            match models.predict_price(&features) {
                Ok(price) => predicted.push(price),
                Err(e) => {
                    warn!("{} {} backtest prediction failed: {}", symbol, algorithm, e);
                    return skip(SkipReason::PredictionFailed);
                }
            }
            actual.push(bars[day].close);
        }

        match ComparisonRecord::from_predictions(&actual, &predicted) {
            Some(record) => {
                info!(
                    "{} {}: MAE {:.4} RMSE {:.4} MAPE {:.2}%",
                    symbol, algorithm, record.mae, record.rmse, record.mape
                );
                AlgorithmOutcome::Scored(record)
            }
            None => skip(SkipReason::PredictionFailed),
        }
    }
}
