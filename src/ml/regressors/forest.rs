//! Random forest regression
//!
//! Bootstrap-sampled CART trees grown on variance reduction, averaged at
//! prediction time. Tree `k` draws its bootstrap sample and feature order
//! from an RNG seeded with `seed + k`, so a fixed seed gives a fixed forest.

use super::RegressionModel;
use crate::config::ForestConfig;
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Tree node stored in a flat arena (children by index)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Single regression tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
}

impl RegressionTree {
    /// Grow a tree on the rows of `x` listed in `indices`
    fn grow(
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        config: &ForestConfig,
        rng: &mut StdRng,
        importances: &mut [f64],
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            n_features: x.ncols(),
        };
        tree.build(x, y, indices, 0, config, rng, importances);
        tree
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
        config: &ForestConfig,
        rng: &mut StdRng,
        importances: &mut [f64],
    ) -> usize {
        let n = indices.len();
        let (sum, sum_sq) = indices
            .iter()
            .fold((0.0, 0.0), |(s, q), &i| (s + y[i], q + y[i] * y[i]));
        let mean = if n > 0 { sum / n as f64 } else { 0.0 };
        let sse = (sum_sq - sum * sum / n.max(1) as f64).max(0.0);

        let depth_exhausted = config.max_depth.is_some_and(|d| depth >= d);
        if depth_exhausted || n < config.min_samples_split.max(2) || sse <= 1e-12 {
            return self.push(TreeNode::Leaf { value: mean, samples: n });
        }

        let split = match best_split(x, y, &indices, config.min_samples_leaf.max(1), rng) {
            Some(split) if split.sse < sse - 1e-12 => split,
            _ => return self.push(TreeNode::Leaf { value: mean, samples: n }),
        };

        importances[split.feature] += sse - split.sse;

        // Reserve the parent slot, then fill in children indices
        let slot = self.push(TreeNode::Leaf { value: mean, samples: n });
        let left = self.build(x, y, split.left, depth + 1, config, rng, importances);
        let right = self.build(x, y, split.right, depth + 1, config, rng, importances);
        self.nodes[slot] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        slot
    }

    fn push(&mut self, node: TreeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(ForecastError::Model(format!(
                "tree: expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value, .. }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return Err(ForecastError::Model("tree: corrupt node index".into())),
            }
        }
    }
}

/// Lowest-SSE split over all features, scanning each feature in sorted order
fn best_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    indices: &[usize],
    min_leaf: usize,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let n = indices.len();
    if n < 2 * min_leaf {
        return None;
    }

    let mut features: Vec<usize> = (0..x.ncols()).collect();
    features.shuffle(rng);

    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, sse)
    let mut sorted = indices.to_vec();

    for &f in &features {
        sorted.sort_by(|&a, &b| x[[a, f]].total_cmp(&x[[b, f]]));

        let total: f64 = sorted.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = sorted.iter().map(|&i| y[i] * y[i]).sum();
        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for k in 1..n {
            let prev = sorted[k - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            let (lo, hi) = (x[[prev, f]], x[[sorted[k], f]]);
            if k < min_leaf || n - k < min_leaf || lo >= hi {
                continue;
            }

            let right_sum = total - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / k as f64)
                + (right_sq - right_sum * right_sum / (n - k) as f64);

            let improves = match best {
                Some((_, _, b)) => sse < b,
                None => true,
            };
            if improves {
                best = Some((f, lo + (hi - lo) / 2.0, sse));
            }
        }
    }

    let (feature, threshold, sse) = best?;
    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.iter().copied().partition(|&i| x[[i, feature]] <= threshold);
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some(SplitCandidate {
        feature,
        threshold,
        sse: sse.max(0.0),
        left,
        right,
    })
}

/// Bagged ensemble of regression trees
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_importances: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Normalized total impurity decrease per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

impl RegressionModel for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n != y.len() {
            return Err(ForecastError::Model(format!(
                "random_forest: {} rows but {} labels",
                n,
                y.len()
            )));
        }
        if n == 0 || self.config.n_trees == 0 {
            return Err(ForecastError::Model("random_forest: nothing to fit".into()));
        }

        let mut importances = vec![0.0; x.ncols()];
        self.trees = (0..self.config.n_trees)
            .map(|k| {
                let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(k as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                RegressionTree::grow(x, y, sample, &self.config, &mut rng, &mut importances)
            })
            .collect();

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        self.feature_importances = importances;
        Ok(())
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(ForecastError::Model("random_forest: not fitted".into()));
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_row(row)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
