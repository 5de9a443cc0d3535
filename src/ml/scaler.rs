//! Standardization (zero mean, unit variance) per column

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit on every row of `x`. Uses the population standard deviation;
    /// constant columns get a scale of 1 so they map to 0.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        let n = x.nrows();
        if n == 0 {
            return Err(ForecastError::InsufficientData {
                stage: "scaler fit",
                required: 1,
                actual: 0,
            });
        }
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ForecastError::Model("empty matrix".into()))?;
        let var = x.var_axis(Axis(0), 0.0);

        // Variance at rounding-noise level counts as constant
        let n = n as f64;
        let scale = ndarray::Zip::from(&var)
            .and(&mean)
            .map_collect(|&v, &m| {
                let noise = n * f64::EPSILON * v + (n * m * f64::EPSILON).powi(2);
                if v.is_finite() && v > noise {
                    v.sqrt()
                } else {
                    1.0
                }
            });
        Ok(Self { mean, scale })
    }

    /// Fit a one-column scaler on a label vector
    pub fn fit_labels(y: &Array1<f64>) -> Result<Self> {
        let column = y.view().insert_axis(Axis(1)).to_owned();
        Self::fit(&column)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Reject decoded scalers whose shape or values cannot be applied
    pub fn validate(&self) -> Result<()> {
        if self.scale.len() != self.mean.len() {
            return Err(ForecastError::Persistence(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite())
            || self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err(ForecastError::Persistence(
                "scaler has non-finite or non-positive entries".into(),
            ));
        }
        Ok(())
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        Ok((x - &self.mean) / &self.scale)
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        Ok((&row - &self.mean) / &self.scale)
    }

    /// Scale labels with a one-column scaler
    pub fn transform_labels(&self, y: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_width(1)?;
        Ok(y.mapv(|v| (v - self.mean[0]) / self.scale[0]))
    }

    /// Back to original units for a one-column scaler
    pub fn inverse_value(&self, scaled: f64) -> Result<f64> {
        self.check_width(1)?;
        Ok(scaled * self.scale[0] + self.mean[0])
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.mean.len() || width != self.scale.len() {
            return Err(ForecastError::Model(format!(
                "scaler width mismatch: fitted on {}, got {}",
                self.mean.len(),
                width
            )));
        }
        Ok(())
    }
}
