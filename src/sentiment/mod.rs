//! News sentiment context attached to predictions
//!
//! Scoring articles is done elsewhere; this module only labels and
//! aggregates compound scores in [-1, 1].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compound scores beyond this magnitude are not neutral
pub const NEUTRAL_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn from_compound(score: f64) -> Self {
        if score > NEUTRAL_BAND {
            SentimentLabel::Positive
        } else if score < -NEUTRAL_BAND {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    /// Mean compound score
    pub score: f64,
    pub label: SentimentLabel,
    pub articles: usize,
}

impl SentimentSummary {
    /// Aggregate per-article compound scores; non-finite scores are ignored
    pub fn from_scores(scores: &[f64]) -> Self {
        let valid: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();
        let score = if valid.is_empty() {
            0.0
        } else {
            valid.iter().sum::<f64>() / valid.len() as f64
        };
        Self {
            score,
            label: SentimentLabel::from_compound(score),
            articles: valid.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_thresholds() {
        assert_eq!(SentimentLabel::from_compound(0.3), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_compound(0.05), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(-0.05), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(-0.051), SentimentLabel::Negative);
    }

    #[test]
    fn test_summary_mean() {
        let summary = SentimentSummary::from_scores(&[0.5, -0.1, 0.2, f64::NAN]);
        assert_eq!(summary.articles, 3);
        assert!((summary.score - 0.2).abs() < 1e-12);
        assert_eq!(summary.label, SentimentLabel::Positive);
        assert_eq!(summary.label.to_string(), "Positive");
    }

    #[test]
    fn test_empty_summary_is_neutral() {
        let summary = SentimentSummary::from_scores(&[]);
        assert_eq!(summary.score, 0.0);
        assert_eq!(summary.label, SentimentLabel::Neutral);
        assert_eq!(summary.articles, 0);
    }
}
