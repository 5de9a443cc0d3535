//! Regression models used by the model bank
//!
//! - `LinearRegression`: ordinary least squares
//! - `RandomForest`: bagged CART trees with a fixed seed
//! - `KernelRegressor`: epsilon-SVR with an RBF kernel
//!
//! All of them operate in scaled space.

mod forest;
mod kernel;
mod linear;
#[cfg(test)]
mod tests;

pub use forest::{RandomForest, RegressionTree, TreeNode};
pub use kernel::KernelRegressor;
pub use linear::LinearRegression;

use crate::config::{ForestConfig, KernelConfig};
use crate::error::Result;
use crate::types::Variant;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Common interface of the regressors
pub trait RegressionModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64>;

    /// Predict every row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Model name for logging
    fn name(&self) -> &str;
}

/// Any bank regressor, serializable as one artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear(LinearRegression),
    RandomForest(RandomForest),
    Kernel(KernelRegressor),
}

impl Regressor {
    /// Unfitted regressor for a variant with fixed hyperparameters
    pub fn for_variant(variant: Variant, forest: &ForestConfig, kernel: &KernelConfig) -> Self {
        match variant {
            Variant::Linear => Regressor::Linear(LinearRegression::new()),
            Variant::RandomForest => Regressor::RandomForest(RandomForest::new(forest.clone())),
            Variant::Kernel => Regressor::Kernel(KernelRegressor::new(kernel.clone())),
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            Regressor::Linear(_) => Variant::Linear,
            Regressor::RandomForest(_) => Variant::RandomForest,
            Regressor::Kernel(_) => Variant::Kernel,
        }
    }

    fn inner(&self) -> &dyn RegressionModel {
        match self {
            Regressor::Linear(m) => m,
            Regressor::RandomForest(m) => m,
            Regressor::Kernel(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn RegressionModel {
        match self {
            Regressor::Linear(m) => m,
            Regressor::RandomForest(m) => m,
            Regressor::Kernel(m) => m,
        }
    }
}

impl RegressionModel for Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        self.inner().predict_row(row)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}
