//! Epsilon-insensitive support vector regression with an RBF kernel
//!
//! The dual is solved by coordinate descent over `beta = alpha - alpha*`
//! with box `[-C, C]`. The bias is folded into the kernel as `K(a, b) + 1`,
//! which removes the equality constraint and lets every coordinate update
//! be solved in closed form (soft threshold at `epsilon`, then clip).

use super::RegressionModel;
use crate::config::KernelConfig;
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KernelRegressor {
    config: KernelConfig,
    support_vectors: Option<Array2<f64>>,
    coefficients: Array1<f64>,
    epochs: usize,
}

impl KernelRegressor {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            support_vectors: None,
            coefficients: Array1::zeros(0),
            epochs: 0,
        }
    }

    pub fn n_support(&self) -> usize {
        self.coefficients.len()
    }

    /// Epochs used by the last fit
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    fn rbf(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let dist: f64 = a.iter().zip(b.iter()).map(|(u, v)| (u - v).powi(2)).sum();
        (-self.config.gamma * dist).exp()
    }
}

impl RegressionModel for KernelRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n != y.len() {
            return Err(ForecastError::Model(format!(
                "svm: {} rows but {} labels",
                n,
                y.len()
            )));
        }
        if n == 0 {
            return Err(ForecastError::Model("svm: no training rows".into()));
        }

        let KernelConfig {
            c,
            epsilon,
            tol,
            max_epochs,
            ..
        } = self.config;

        // Augmented Gram matrix Q = K + 1
        let mut q = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let k = self.rbf(x.row(i), x.row(j)) + 1.0;
                q[[i, j]] = k;
                q[[j, i]] = k;
            }
        }

        let mut beta = Array1::<f64>::zeros(n);
        // f[i] = sum_j Q[i, j] * beta[j]
        let mut f = Array1::<f64>::zeros(n);
        let mut epochs = 0;

        for epoch in 0..max_epochs {
            epochs = epoch + 1;
            let mut max_delta: f64 = 0.0;

            for i in 0..n {
                let qii = q[[i, i]];
                let old = beta[i];
                let z = old + (y[i] - f[i]) / qii;
                let shrunk = z.signum() * (z.abs() - epsilon / qii).max(0.0);
                let new = shrunk.clamp(-c, c);
                let delta = new - old;
                if delta != 0.0 {
                    beta[i] = new;
                    f.scaled_add(delta, &q.column(i));
                    max_delta = max_delta.max(delta.abs());
                }
            }

            if max_delta < tol {
                break;
            }
        }

        if epochs == max_epochs {
            tracing::debug!("svm: reached {} epochs without converging", max_epochs);
        }
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(ForecastError::Model("svm: solver diverged".into()));
        }

        let support: Vec<usize> = (0..n).filter(|&i| beta[i] != 0.0).collect();
        self.support_vectors = Some(x.select(Axis(0), &support));
        self.coefficients = support.iter().map(|&i| beta[i]).collect();
        self.epochs = epochs;
        Ok(())
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        let sv = self
            .support_vectors
            .as_ref()
            .ok_or_else(|| ForecastError::Model("svm: not fitted".into()))?;
        if sv.ncols() != row.len() && sv.nrows() > 0 {
            return Err(ForecastError::Model(format!(
                "svm: expected {} features, got {}",
                sv.ncols(),
                row.len()
            )));
        }
        Ok(sv
            .rows()
            .into_iter()
            .zip(self.coefficients.iter())
            .map(|(s, &b)| b * (self.rbf(s, row) + 1.0))
            .sum())
    }

    fn name(&self) -> &str {
        "svm"
    }
}
