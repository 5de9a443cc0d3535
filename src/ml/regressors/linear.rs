//! Ordinary least squares
//!
//! Solved through the normal equations on centred data. The lag and mean
//! columns are exactly collinear, so a vanishing ridge keeps the Gram matrix
//! positive definite and picks the small-norm solution.

use super::RegressionModel;
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

const RIDGE: f64 = 1e-10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }
}

impl RegressionModel for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(ForecastError::Model(format!(
                "linear: {} rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(ForecastError::Model("linear: no training rows".into()));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ForecastError::Model("linear: empty design".into()))?;
        let y_mean = y.mean().unwrap_or(0.0);
        let xc = x - &x_mean;
        let yc = y - y_mean;

        let mut gram = xc.t().dot(&xc);
        let rhs = xc.t().dot(&yc);

        let p = gram.nrows();
        let mean_diag = gram.diag().sum() / p.max(1) as f64;
        let ridge = RIDGE * mean_diag.max(1.0);
        for i in 0..p {
            gram[[i, i]] += ridge;
        }

        let beta = cholesky_solve(&gram, &rhs)?;
        self.intercept = y_mean - x_mean.dot(&beta);
        self.coefficients = Some(beta);
        Ok(())
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        let coef = self
            .coefficients
            .as_ref()
            .ok_or_else(|| ForecastError::Model("linear: not fitted".into()))?;
        if coef.len() != row.len() {
            return Err(ForecastError::Model(format!(
                "linear: expected {} features, got {}",
                coef.len(),
                row.len()
            )));
        }
        Ok(row.dot(coef) + self.intercept)
    }

    fn name(&self) -> &str {
        "linear_regression"
    }
}

/// Solve `a x = b` for symmetric positive definite `a`
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(ForecastError::Model(
                        "linear: normal equations not positive definite".into(),
                    ));
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    // Forward: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }

    // Backward: L^T x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }

    Ok(x)
}
