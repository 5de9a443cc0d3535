//! Technical indicators over a close series
//!
//! Values are taken at the last bar. Anything undefined for the available
//! history (short series, 0/0) is reported as `0.0`.


use crate::types::Bar;
use serde::{Deserialize, Serialize};

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub sma_200: f64,
    pub bb_middle: f64,
    /// (upper - lower) / middle with bands at two standard deviations
    pub bb_width: f64,
}

impl IndicatorSnapshot {
    pub fn from_bars(bars: &[Bar]) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Self::from_closes(&closes)
    }

    pub fn from_closes(closes: &[f64]) -> Self {
        if closes.is_empty() {
            return Self::default();
        }

        let fast = ema_series(closes, MACD_FAST);
        let slow = ema_series(closes, MACD_SLOW);
        let macd: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
        let signal = ema_series(&macd, MACD_SIGNAL);

        let macd_last = macd.last().copied().unwrap_or(0.0);
        let signal_last = signal.last().copied().unwrap_or(0.0);

        let sma_20 = sma(closes, BOLLINGER_PERIOD);
        let bb_width = match (sma_20, sample_std(closes, BOLLINGER_PERIOD)) {
            (Some(mid), Some(sd)) if mid != 0.0 => 4.0 * sd / mid,
            _ => 0.0,
        };

        Self {
            rsi: finite_or_zero(rsi(closes, RSI_PERIOD)),
            macd: finite_or_zero(Some(macd_last)),
            macd_signal: finite_or_zero(Some(signal_last)),
            macd_histogram: finite_or_zero(Some(macd_last - signal_last)),
            sma_20: finite_or_zero(sma_20),
            sma_50: finite_or_zero(sma(closes, 50)),
            sma_200: finite_or_zero(sma(closes, 200)),
            bb_middle: finite_or_zero(sma_20),
            bb_width: finite_or_zero(Some(bb_width)),
        }
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// RSI from simple means of the last `period` gains and losses.
///
/// The first bar counts as a zero change. `None` with fewer than `period`
/// bars or when there was no movement at all.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in (closes.len() - period)..closes.len() {
        let change = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { Some(100.0) } else { None };
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// Recursive EMA seeded with the first value, `alpha = 2 / (span + 1)`
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = None;
    for &v in values {
        let next = match prev {
            Some(p) => alpha * v + (1.0 - alpha) * p,
            None => v,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Mean of the trailing `window` values
pub fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

fn sample_std(values: &[f64], window: usize) -> Option<f64> {
    if window < 2 || values.len() < window {
        return None;
    }
    let mean = sma(values, window)?;
    let tail = &values[values.len() - window..];
    let var = tail.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
    Some(var.sqrt())
}
