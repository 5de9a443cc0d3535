//! Model bank: training, persistence and loading of per-symbol models
//!
//! A trained set for (symbol, algorithm) is a feature scaler, a label
//! scaler and one regressor per variant the algorithm uses. Scalers are fit
//! on every feature row before the shuffled train/test split; regressors
//! see only the train partition.

use super::features::{FeatureVector, FEATURE_WIDTH, LOOKBACK};
use super::mapper::BatchMapper;
use super::regressors::{RegressionModel, Regressor};
use super::scaler::StandardScaler;
use crate::config::{Config, ForestConfig, KernelConfig, TrainingConfig};
use crate::error::{ForecastError, Result};
use crate::store::{ArtifactKey, ArtifactStore, Component};
use crate::types::{Algorithm, Bar, Variant};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hold-out statistics of one training run (price units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub holdout_mae: Option<f64>,
    /// Percent
    pub holdout_mape: Option<f64>,
    pub holdout_r2: Option<f64>,
}

/// Fitted scalers and regressors for one (symbol, algorithm)
#[derive(Debug, Clone)]
pub struct TrainedModels {
    pub symbol: String,
    pub algorithm: Algorithm,
    feature_scaler: StandardScaler,
    label_scaler: StandardScaler,
    regressors: Vec<Regressor>,
    report: Option<TrainingReport>,
}

impl TrainedModels {
    pub fn regressors(&self) -> &[Regressor] {
        &self.regressors
    }

    pub fn feature_scaler(&self) -> &StandardScaler {
        &self.feature_scaler
    }

    pub fn label_scaler(&self) -> &StandardScaler {
        &self.label_scaler
    }

    /// Report of the run that produced these models, if it was persisted
    pub fn report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    /// Each regressor's prediction in scaled label space, in variant order
    pub fn scaled_predictions(&self, row: &FeatureVector) -> Result<Vec<f64>> {
        let scaled = self.feature_scaler.transform_row(ArrayView1::from(&row[..]))?;
        self.regressors
            .iter()
            .map(|m| m.predict_row(scaled.view()))
            .collect()
    }

    /// Mean of the scaled predictions
    pub fn predict_scaled(&self, row: &FeatureVector) -> Result<f64> {
        let preds = self.scaled_predictions(row)?;
        mean_prediction(&preds)
    }

    /// Price for a raw feature row: one inverse transform of the scaled mean
    pub fn predict_price(&self, row: &FeatureVector) -> Result<f64> {
        let scaled = self.predict_scaled(row)?;
        let price = self.label_scaler.inverse_value(scaled)?;
        if !price.is_finite() {
            return Err(ForecastError::Model(format!(
                "{} produced a non-finite price",
                self.algorithm
            )));
        }
        Ok(price)
    }

    /// Price for a row that is already in scaled feature space
    fn predict_price_scaled_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        let preds = self
            .regressors
            .iter()
            .map(|m| m.predict_row(row))
            .collect::<Result<Vec<f64>>>()?;
        self.label_scaler.inverse_value(mean_prediction(&preds)?)
    }
}

fn mean_prediction(preds: &[f64]) -> Result<f64> {
    if preds.is_empty() {
        return Err(ForecastError::Model("no regressors in model set".into()));
    }
    Ok(preds.iter().sum::<f64>() / preds.len() as f64)
}

/// Trains, persists and loads model sets through an injected artifact store
pub struct ModelBank {
    store: Arc<dyn ArtifactStore>,
    mapper: BatchMapper,
    training: TrainingConfig,
    forest: ForestConfig,
    kernel: KernelConfig,
}

impl ModelBank {
    pub fn new(store: Arc<dyn ArtifactStore>, config: &Config) -> Self {
        Self {
            store,
            mapper: BatchMapper::new(config.engine.workers, config.engine.preserve_chunk_lookback),
            training: config.training.clone(),
            forest: config.forest.clone(),
            kernel: config.kernel.clone(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Fewest bars that can yield enough feature rows to train
    pub fn min_bars(&self) -> usize {
        self.training.min_rows.max(1) + LOOKBACK
    }

    /// Fit a fresh model set on `bars` and persist it.
    ///
    /// `None` when there are too few usable rows or a regressor fails; in
    /// both cases nothing is written.
    pub fn train(
        &self,
        symbol: &str,
        algorithm: Algorithm,
        bars: &[Bar],
    ) -> Option<(TrainedModels, TrainingReport)> {
        match self.fit(symbol, algorithm, bars) {
            Ok((models, report)) => {
                self.persist(&models, &report);
                Some((models, report))
            }
            Err(e) if e.is_insufficient_data() => {
                warn!("Not training {} {}: {}", symbol, algorithm, e);
                None
            }
            Err(e) => {
                warn!("Training {} {} failed: {}", symbol, algorithm, e);
                None
            }
        }
    }

    /// Load a persisted set; `None` if any required component is missing
    /// or cannot be decoded.
    pub fn load(&self, symbol: &str, algorithm: Algorithm) -> Option<TrainedModels> {
        match self.try_load(symbol, algorithm) {
            Ok(Some(models)) => {
                debug!("Loaded {} {} from artifact store", symbol, algorithm);
                Some(models)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring stored {} {} models: {}", symbol, algorithm, e);
                None
            }
        }
    }

    /// Load when available, otherwise train on `bars`
    pub fn load_or_train(
        &self,
        symbol: &str,
        algorithm: Algorithm,
        bars: &[Bar],
    ) -> Option<TrainedModels> {
        if let Some(models) = self.load(symbol, algorithm) {
            return Some(models);
        }
        self.train(symbol, algorithm, bars).map(|(models, _)| models)
    }

    fn fit(
        &self,
        symbol: &str,
        algorithm: Algorithm,
        bars: &[Bar],
    ) -> Result<(TrainedModels, TrainingReport)> {
        let set = self.mapper.map_reduce(bars);
        let min_rows = self.training.min_rows.max(1);
        if set.len() < min_rows {
            return Err(ForecastError::InsufficientData {
                stage: "training",
                required: min_rows,
                actual: set.len(),
            });
        }

        let x = set.matrix();
        let y = set.label_vector();
        let feature_scaler = StandardScaler::fit(&x)?;
        let label_scaler = StandardScaler::fit_labels(&y)?;
        let xs = feature_scaler.transform(&x)?;
        let ys = label_scaler.transform_labels(&y)?;

        let (train_idx, test_idx) = self.split(set.len());
        let x_train = xs.select(Axis(0), &train_idx);
        let y_train = ys.select(Axis(0), &train_idx);

        let mut regressors = Vec::with_capacity(algorithm.variants().len());
        for &variant in algorithm.variants() {
            let mut model = Regressor::for_variant(variant, &self.forest, &self.kernel);
            model.fit(&x_train, &y_train)?;
            debug!("Fitted {} on {} rows", model.name(), train_idx.len());
            regressors.push(model);
        }

        let mut models = TrainedModels {
            symbol: symbol.to_uppercase(),
            algorithm,
            feature_scaler,
            label_scaler,
            regressors,
            report: None,
        };

        let x_test = xs.select(Axis(0), &test_idx);
        let y_test = y.select(Axis(0), &test_idx);
        let report = holdout_report(&models, &x_test, &y_test, set.len(), train_idx.len())?;
        models.report = Some(report.clone());

        info!(
            "Trained {} {} on {} samples ({} train / {} test)",
            models.symbol,
            algorithm,
            report.samples,
            report.train_rows,
            report.test_rows
        );
        Ok((models, report))
    }

    /// Seeded shuffle split; the first `ceil(fraction * n)` shuffled indices
    /// are held out, always leaving at least one training row
    fn split(&self, n: usize) -> (Vec<usize>, Vec<usize>) {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.training.split_seed);
        indices.shuffle(&mut rng);

        let fraction = self.training.test_fraction.clamp(0.0, 1.0);
        let n_test = ((fraction * n as f64).ceil() as usize).min(n.saturating_sub(1));
        let train = indices.split_off(n_test);
        (train, indices)
    }

    /// Write every component; a failed write only loses the cache
    fn persist(&self, models: &TrainedModels, report: &TrainingReport) {
        if let Err(e) = self.try_persist(models, report) {
            warn!(
                "Could not persist {} {} models: {}",
                models.symbol, models.algorithm, e
            );
        }
    }

    fn try_persist(&self, models: &TrainedModels, report: &TrainingReport) -> Result<()> {
        let key = |component| ArtifactKey::new(&models.symbol, models.algorithm, component);

        self.store.put(
            &key(Component::FeatureScaler),
            &serde_json::to_vec(&models.feature_scaler)?,
        )?;
        self.store.put(
            &key(Component::LabelScaler),
            &serde_json::to_vec(&models.label_scaler)?,
        )?;
        for model in &models.regressors {
            self.store.put(
                &key(Component::Model(model.variant())),
                &serde_json::to_vec(model)?,
            )?;
        }
        self.store
            .put(&key(Component::Report), &serde_json::to_vec(report)?)?;
        Ok(())
    }

    fn try_load(&self, symbol: &str, algorithm: Algorithm) -> Result<Option<TrainedModels>> {
        let feature_scaler: StandardScaler =
            match self.read(symbol, algorithm, Component::FeatureScaler)? {
                Some(v) => v,
                None => return Ok(None),
            };
        let label_scaler: StandardScaler =
            match self.read(symbol, algorithm, Component::LabelScaler)? {
                Some(v) => v,
                None => return Ok(None),
            };
        if feature_scaler.n_features() != FEATURE_WIDTH || label_scaler.n_features() != 1 {
            return Err(ForecastError::Persistence("scaler shape mismatch".into()));
        }
        feature_scaler.validate()?;
        label_scaler.validate()?;

        let mut regressors = Vec::with_capacity(algorithm.variants().len());
        for &variant in algorithm.variants() {
            let model: Regressor = match self.read(symbol, algorithm, Component::Model(variant))? {
                Some(v) => v,
                None => return Ok(None),
            };
            if model.variant() != variant {
                return Err(ForecastError::Persistence(format!(
                    "expected {} model, found {}",
                    variant,
                    model.variant()
                )));
            }
            regressors.push(model);
        }

        let report = self
            .read::<TrainingReport>(symbol, algorithm, Component::Report)
            .unwrap_or(None);

        Ok(Some(TrainedModels {
            symbol: symbol.to_uppercase(),
            algorithm,
            feature_scaler,
            label_scaler,
            regressors,
            report,
        }))
    }

    fn read<T: serde::de::DeserializeOwned>(
        &self,
        symbol: &str,
        algorithm: Algorithm,
        component: Component,
    ) -> Result<Option<T>> {
        let key = ArtifactKey::new(symbol, algorithm, component);
        match self.store.get(&key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| ForecastError::Persistence(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Variants whose artifacts are present for (symbol, algorithm)
    pub fn stored_variants(&self, symbol: &str, algorithm: Algorithm) -> Vec<Variant> {
        algorithm
            .variants()
            .iter()
            .copied()
            .filter(|&v| {
                self.store
                    .exists(&ArtifactKey::new(symbol, algorithm, Component::Model(v)))
            })
            .collect()
    }
}

fn holdout_report(
    models: &TrainedModels,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
    samples: usize,
    train_rows: usize,
) -> Result<TrainingReport> {
    let test_rows = y_test.len();
    let mut report = TrainingReport {
        samples,
        train_rows,
        test_rows,
        holdout_mae: None,
        holdout_mape: None,
        holdout_r2: None,
    };
    if test_rows == 0 {
        return Ok(report);
    }

    let predicted = x_test
        .rows()
        .into_iter()
        .map(|row| models.predict_price_scaled_row(row))
        .collect::<Result<Vec<f64>>>()?;

    let n = test_rows as f64;
    let mae = predicted
        .iter()
        .zip(y_test.iter())
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / n;

    let pct: Vec<f64> = predicted
        .iter()
        .zip(y_test.iter())
        .filter(|(_, a)| **a != 0.0)
        .map(|(p, a)| ((a - p) / a).abs())
        .collect();
    let mape = if pct.is_empty() {
        None
    } else {
        Some(pct.iter().sum::<f64>() / pct.len() as f64 * 100.0)
    };

    let mean = y_test.sum() / n;
    let ss_tot: f64 = y_test.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = predicted
        .iter()
        .zip(y_test.iter())
        .map(|(p, a)| (a - p).powi(2))
        .sum();
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    report.holdout_mae = Some(mae);
    report.holdout_mape = mape;
    report.holdout_r2 = Some(r2);
    Ok(report)
}
