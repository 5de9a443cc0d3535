//! Multi-day forecasting by feeding predictions back as synthetic bars
//!
//! INIT loads or trains the model set. Each STEP builds features from the
//! trailing window of `base ++ synthetic`, predicts the next close, records
//! it one calendar day after the current last date and appends a synthetic
//! bar for that close. A failed step ends the run with what was produced.

use super::bank::{ModelBank, TrainedModels, TrainingReport};
use super::features::{latest_features, MIN_BATCH_BARS};
use crate::types::{Algorithm, Bar, PredictionPoint};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bars required before a run is attempted
pub const MIN_FORECAST_BARS: usize = 10;

/// Real history plus the bars synthesized so far
struct Rollout<'a> {
    base: &'a [Bar],
    synthetic: Vec<Bar>,
    volume: f64,
}

impl<'a> Rollout<'a> {
    fn new(base: &'a [Bar]) -> Self {
        let volume = if base.is_empty() {
            0.0
        } else {
            base.iter().map(|b| b.volume).sum::<f64>() / base.len() as f64
        };
        Self {
            base,
            synthetic: Vec::new(),
            volume,
        }
    }

    /// Last `MIN_BATCH_BARS` bars of `base ++ synthetic`
    fn window(&self) -> Vec<Bar> {
        let from_synthetic = self.synthetic.len().min(MIN_BATCH_BARS);
        let from_base = (MIN_BATCH_BARS - from_synthetic).min(self.base.len());
        let mut window = Vec::with_capacity(MIN_BATCH_BARS);
        window.extend_from_slice(&self.base[self.base.len() - from_base..]);
        window.extend_from_slice(&self.synthetic[self.synthetic.len() - from_synthetic..]);
        window
    }

    fn last_date(&self) -> Option<NaiveDate> {
        self.synthetic
            .last()
            .or_else(|| self.base.last())
            .map(|b| b.date)
    }

    fn push(&mut self, date: NaiveDate, price: f64) {
        self.synthetic.push(Bar::synthetic(date, price, self.volume));
    }
}

/// Points of one run plus the report of the model set that produced them
#[derive(Debug, Clone)]
pub struct Forecast {
    pub points: Vec<PredictionPoint>,
    pub report: Option<TrainingReport>,
}

pub struct Forecaster {
    bank: Arc<ModelBank>,
}

impl Forecaster {
    pub fn new(bank: Arc<ModelBank>) -> Self {
        Self { bank }
    }

    /// Forecast `days` closes after the end of `bars`.
    ///
    /// `None` when the history is too short or no model set could be
    /// loaded or trained; otherwise up to `days` points.
    pub fn run(
        &self,
        symbol: &str,
        algorithm: Algorithm,
        bars: &[Bar],
        days: usize,
    ) -> Option<Vec<PredictionPoint>> {
        self.run_detailed(symbol, algorithm, bars, days)
            .map(|forecast| forecast.points)
    }

    /// Like [`Forecaster::run`], keeping the model set's training report
    pub fn run_detailed(
        &self,
        symbol: &str,
        algorithm: Algorithm,
        bars: &[Bar],
        days: usize,
    ) -> Option<Forecast> {
        if bars.len() < MIN_FORECAST_BARS {
            warn!(
                "Not forecasting {}: {} bars, need {}",
                symbol,
                bars.len(),
                MIN_FORECAST_BARS
            );
            return None;
        }
        let models = self.bank.load_or_train(symbol, algorithm, bars)?;
        Some(Forecast {
            points: roll_forward(&models, bars, days),
            report: models.report().cloned(),
        })
    }
}

/// Self-feeding loop over an already trained model set
pub fn roll_forward(models: &TrainedModels, bars: &[Bar], days: usize) -> Vec<PredictionPoint> {
    let mut rollout = Rollout::new(bars);
    let mut points = Vec::with_capacity(days);

    for step in 0..days {
        let Some(features) = latest_features(&rollout.window()) else {
            debug!("Stopping at step {}: not enough trailing bars", step);
            break;
        };
        let price = match models.predict_price(&features) {
            Ok(p) => p,
            Err(e) => {
                warn!("Forecast for {} stopped at step {}: {}", models.symbol, step, e);
                break;
            }
        };
        let Some(date) = rollout.last_date().and_then(|d| d.succ_opt()) else {
            break;
        };

        points.push(PredictionPoint { date, price });
        rollout.push(date, price);
    }
    points
}
