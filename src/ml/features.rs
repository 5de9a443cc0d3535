//! Feature extraction from daily bars
//!
//! Each sample is built from a trailing window of `LOOKBACK` bars:
//!
//! ```text
//! [c(i-1), c(i-2), c(i-3), c(i-4), c(i-5), mean(c), std(c), vol(i-1)]
//! ```
//!
//! and paired with the close of bar `i`. The inference path calls the same
//! function with `i == bars.len()`, so both paths share one formula.

use crate::types::Bar;
use ndarray::{Array1, Array2};

/// Bars in a feature window
pub const LOOKBACK: usize = 5;

/// Length of a feature vector
pub const FEATURE_WIDTH: usize = LOOKBACK + 3;

/// Minimum bars that yield one labelled sample
pub const MIN_BATCH_BARS: usize = LOOKBACK + 1;

pub type FeatureVector = [f64; FEATURE_WIDTH];

/// Labelled samples in extraction order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub rows: Vec<FeatureVector>,
    pub labels: Vec<f64>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append another set, preserving order
    pub fn extend(&mut self, other: FeatureSet) {
        self.rows.extend(other.rows);
        self.labels.extend(other.labels);
    }

    /// Feature matrix (samples x FEATURE_WIDTH)
    pub fn matrix(&self) -> Array2<f64> {
        let flat: Vec<f64> = self.rows.iter().flat_map(|r| r.iter().copied()).collect();
        Array2::from_shape_vec((self.rows.len(), FEATURE_WIDTH), flat)
            .unwrap_or_else(|_| Array2::zeros((0, FEATURE_WIDTH)))
    }

    pub fn label_vector(&self) -> Array1<f64> {
        Array1::from_vec(self.labels.clone())
    }
}

/// Feature vector from the window `bars[i-LOOKBACK..i]`.
///
/// Returns `None` when `i < LOOKBACK` or `i > bars.len()`.
pub fn features_at(bars: &[Bar], i: usize) -> Option<FeatureVector> {
    if i < LOOKBACK || i > bars.len() {
        return None;
    }
    let window = &bars[i - LOOKBACK..i];

    let mut out = [0.0; FEATURE_WIDTH];
    for (lag, slot) in out.iter_mut().take(LOOKBACK).enumerate() {
        *slot = window[LOOKBACK - 1 - lag].close;
    }

    let mean = window.iter().map(|b| b.close).sum::<f64>() / LOOKBACK as f64;
    let var = window.iter().map(|b| (b.close - mean).powi(2)).sum::<f64>()
        / (LOOKBACK - 1) as f64;

    out[LOOKBACK] = mean;
    out[LOOKBACK + 1] = var.sqrt();
    out[LOOKBACK + 2] = window[LOOKBACK - 1].volume;

    for v in out.iter_mut() {
        if !v.is_finite() {
            *v = 0.0;
        }
    }
    Some(out)
}

/// Single-row features for predicting the bar after the end of `bars`.
///
/// Requires `MIN_BATCH_BARS` bars, the same minimum as the batch path.
pub fn latest_features(bars: &[Bar]) -> Option<FeatureVector> {
    if bars.len() < MIN_BATCH_BARS {
        return None;
    }
    features_at(bars, bars.len())
}

/// All labelled samples of a contiguous slice; empty below `MIN_BATCH_BARS`
pub fn extract_batch(bars: &[Bar]) -> FeatureSet {
    let mut set = FeatureSet::default();
    if bars.len() < MIN_BATCH_BARS {
        return set;
    }
    for i in LOOKBACK..bars.len() {
        if let Some(row) = features_at(bars, i) {
            set.rows.push(row);
            set.labels.push(bars[i].close);
        }
    }
    set
}
