//! Forecast engine: fetches history and drives the model components
//!
//! Every operation reports absence (`None`, skipped outcomes) instead of
//! failing. Model work runs on the blocking pool so callers on the async
//! runtime are not stalled.

#[cfg(test)]
mod tests;

use crate::config::{Config, MetricsSource};
use crate::data::{DateRange, HistoricalDataProvider};
use crate::indicators::IndicatorSnapshot;
use crate::ml::backtest::round_to;
use crate::ml::{Comparator, ComparisonReport, Forecaster, ModelBank, SkipReason, TrainingReport};
use crate::sentiment::SentimentSummary;
use crate::store::ArtifactStore;
use crate::types::{Algorithm, Bar, PredictionPoint};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// History window for indicator snapshots
pub const INDICATOR_DAYS: i64 = 180;

/// Accuracy/confidence figures attached to a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub confidence: f64,
    /// Whether the figures were measured or are placeholders
    pub source: MetricsSource,
}

impl ModelMetrics {
    /// Random figures in the bands the dashboard expects; not measured
    pub fn placeholder<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let accuracy = 0.85 + rng.random::<f64>() * 0.1;
        let confidence = 0.75 + rng.random::<f64>() * 0.2;
        Self {
            accuracy: round_to(accuracy, 3).unwrap_or(0.85),
            confidence: round_to(confidence, 3).unwrap_or(0.75),
            source: MetricsSource::Placeholder,
        }
    }

    /// Accuracy as `1 - MAPE` and confidence as R², both clamped to [0, 1]
    pub fn from_report(report: &TrainingReport) -> Option<Self> {
        let mape = report.holdout_mape?;
        let r2 = report.holdout_r2?;
        Some(Self {
            accuracy: round_to((1.0 - mape / 100.0).clamp(0.0, 1.0), 3)?,
            confidence: round_to(r2.clamp(0.0, 1.0), 3)?,
            source: MetricsSource::Holdout,
        })
    }
}

/// Result of a prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionBundle {
    pub symbol: String,
    pub algorithm: Algorithm,
    pub predictions: Vec<PredictionPoint>,
    pub model_metrics: ModelMetrics,
    pub sentiment: Option<SentimentSummary>,
    pub generated_at: DateTime<Utc>,
}

pub struct ForecastEngine {
    provider: Arc<dyn HistoricalDataProvider>,
    bank: Arc<ModelBank>,
    forecaster: Arc<Forecaster>,
    comparator: Arc<Comparator>,
    config: Config,
}

impl ForecastEngine {
    pub fn new(
        provider: Arc<dyn HistoricalDataProvider>,
        store: Arc<dyn ArtifactStore>,
        config: Config,
    ) -> Self {
        let bank = Arc::new(ModelBank::new(store, &config));
        Self {
            provider,
            forecaster: Arc::new(Forecaster::new(bank.clone())),
            comparator: Arc::new(Comparator::new(bank.clone(), config.backtest.holdout_days)),
            bank,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Retrain on `train_years` of history, replacing stored models
    pub async fn train(&self, symbol: &str, algorithm: Algorithm) -> Option<TrainingReport> {
        let bars = self.history(symbol, self.years(self.config.engine.train_years)).await?;

        let bank = self.bank.clone();
        let sym = symbol.to_string();
        let result = tokio::task::spawn_blocking(move || bank.train(&sym, algorithm, &bars)).await;
        match result {
            Ok(trained) => trained.map(|(_, report)| report),
            Err(e) => {
                warn!("Training task for {} panicked: {}", symbol, e);
                None
            }
        }
    }

    /// Forecast `days` closes using stored models when present
    pub async fn predict(
        &self,
        symbol: &str,
        algorithm: Algorithm,
        days: usize,
        sentiment: Option<SentimentSummary>,
    ) -> Option<PredictionBundle> {
        let bars = self.history(symbol, self.years(self.config.engine.predict_years)).await?;

        let forecaster = self.forecaster.clone();
        let sym = symbol.to_string();
        let forecast = match tokio::task::spawn_blocking(move || {
            forecaster.run_detailed(&sym, algorithm, &bars, days)
        })
        .await
        {
            Ok(forecast) => forecast?,
            Err(e) => {
                warn!("Forecast task for {} panicked: {}", symbol, e);
                return None;
            }
        };

        if forecast.points.is_empty() && days > 0 {
            warn!("No predictions produced for {} {}", symbol, algorithm);
            return None;
        }

        let model_metrics = match self.config.engine.metrics_source {
            MetricsSource::Placeholder => ModelMetrics::placeholder(&mut rand::rng()),
            MetricsSource::Holdout => forecast
                .report
                .as_ref()
                .and_then(ModelMetrics::from_report)
                .unwrap_or_else(|| {
                    warn!(
                        "No hold-out metrics stored for {} {}, using placeholders",
                        symbol, algorithm
                    );
                    ModelMetrics::placeholder(&mut rand::rng())
                }),
        };

        info!(
            "Predicted {} days for {} with {}",
            forecast.points.len(),
            symbol,
            algorithm
        );

        Some(PredictionBundle {
            symbol: symbol.to_uppercase(),
            algorithm,
            predictions: forecast.points,
            model_metrics,
            sentiment,
            generated_at: Utc::now(),
        })
    }

    /// Walk-forward comparison of every algorithm on one fetch of history
    pub async fn compare(&self, symbol: &str) -> ComparisonReport {
        let Some(bars) = self.history(symbol, self.years(self.config.engine.train_years)).await else {
            return ComparisonReport::skipped_all(symbol, SkipReason::InsufficientHistory);
        };

        let comparator = self.comparator.clone();
        let sym = symbol.to_string();
        match tokio::task::spawn_blocking(move || comparator.compare(&sym, &bars)).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Comparison task for {} panicked: {}", symbol, e);
                ComparisonReport::skipped_all(symbol, SkipReason::TrainingFailed)
            }
        }
    }

    /// Indicator snapshot over the last `INDICATOR_DAYS` days
    pub async fn indicators(&self, symbol: &str) -> Option<IndicatorSnapshot> {
        let range = DateRange::trailing_days(today(), INDICATOR_DAYS);
        let bars = self.history(symbol, range).await?;
        Some(IndicatorSnapshot::from_bars(&bars))
    }

    fn years(&self, years: u32) -> DateRange {
        DateRange::trailing_years(today(), years)
    }

    /// Fetch bars; failures and empty series become `None`
    async fn history(&self, symbol: &str, range: DateRange) -> Option<Vec<Bar>> {
        match self.provider.fetch(symbol, range).await {
            Ok(series) if series.is_empty() => {
                warn!("No data for {} between {} and {}", symbol, range.start, range.end);
                None
            }
            Ok(series) => Some(series.bars),
            Err(e) => {
                warn!("Fetching {} failed: {}", symbol, e);
                None
            }
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
