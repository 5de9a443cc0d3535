//! Tests for the regressors

use super::*;
use ndarray::{array, Array1, Array2};

/// y = 2*x0 - x1 + 3 over a small grid
fn linear_data() -> (Array2<f64>, Array1<f64>) {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..10 {
        for j in 0..5 {
            let (a, b) = (i as f64 * 0.3, j as f64 * 0.7 - 1.0);
            rows.extend_from_slice(&[a, b]);
            labels.push(2.0 * a - b + 3.0);
        }
    }
    (
        Array2::from_shape_vec((labels.len(), 2), rows).unwrap(),
        Array1::from_vec(labels),
    )
}

#[test]
fn test_linear_recovers_coefficients() {
    let (x, y) = linear_data();
    let mut model = LinearRegression::new();
    model.fit(&x, &y).unwrap();

    let coef = model.coefficients().unwrap();
    assert!((coef[0] - 2.0).abs() < 1e-6);
    assert!((coef[1] + 1.0).abs() < 1e-6);
    let at_origin = model.predict_row(array![0.0, 0.0].view()).unwrap();
    assert!((at_origin - 3.0).abs() < 1e-6);

    let pred = model.predict_row(array![1.0, 1.0].view()).unwrap();
    assert!((pred - 4.0).abs() < 1e-6);
}

#[test]
fn test_linear_handles_collinear_columns() {
    // Third column duplicates the first
    let x = array![[1.0, 0.5, 1.0], [2.0, 0.1, 2.0], [3.0, 0.9, 3.0], [4.0, 0.3, 4.0], [5.0, 0.7, 5.0]];
    let y = x.column(0).mapv(|v| 10.0 * v) + x.column(1).mapv(|v| v);
    let mut model = LinearRegression::new();
    model.fit(&x, &y).unwrap();

    for (row, target) in x.rows().into_iter().zip(y.iter()) {
        assert!((model.predict_row(row).unwrap() - target).abs() < 1e-4);
    }
}

#[test]
fn test_linear_rejects_bad_shapes() {
    let mut model = LinearRegression::new();
    let x = Array2::<f64>::zeros((3, 2));
    let y = Array1::<f64>::zeros(4);
    assert!(model.fit(&x, &y).is_err());
    assert!(model.predict_row(array![1.0, 2.0].view()).is_err()); // not fitted
}

#[test]
fn test_forest_is_deterministic_for_seed() {
    let (x, y) = linear_data();
    let config = ForestConfig {
        n_trees: 10,
        ..Default::default()
    };

    let mut a = RandomForest::new(config.clone());
    let mut b = RandomForest::new(config);
    a.fit(&x, &y).unwrap();
    b.fit(&x, &y).unwrap();

    assert_eq!(a.n_trees(), 10);
    let row = array![1.5, 0.4];
    assert_eq!(a.predict_row(row.view()).unwrap(), b.predict_row(row.view()).unwrap());
}

#[test]
fn test_forest_fits_training_range() {
    let (x, y) = linear_data();
    let mut forest = RandomForest::new(ForestConfig {
        n_trees: 20,
        ..Default::default()
    });
    forest.fit(&x, &y).unwrap();

    let preds = forest.predict(&x).unwrap();
    let mae = preds
        .iter()
        .zip(y.iter())
        .map(|(p, t)| (p - t).abs())
        .sum::<f64>()
        / y.len() as f64;
    assert!(mae < 0.5, "mae {}", mae);

    let importances = forest.feature_importances();
    assert_eq!(importances.len(), 2);
    assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn test_tree_depth_limit_gives_stump() {
    let (x, y) = linear_data();
    let mut forest = RandomForest::new(ForestConfig {
        n_trees: 1,
        max_depth: Some(1),
        ..Default::default()
    });
    forest.fit(&x, &y).unwrap();
    let serialized = serde_json::to_value(&forest).unwrap();
    let nodes = serialized["trees"][0]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
}

#[test]
fn test_forest_constant_labels_single_leaf() {
    let x = array![[1.0], [2.0], [3.0], [4.0]];
    let y = array![7.0, 7.0, 7.0, 7.0];
    let mut forest = RandomForest::new(ForestConfig {
        n_trees: 3,
        ..Default::default()
    });
    forest.fit(&x, &y).unwrap();
    assert_eq!(forest.predict_row(array![10.0].view()).unwrap(), 7.0);
}

#[test]
fn test_kernel_fits_smooth_function() {
    let n = 40;
    let x = Array2::from_shape_fn((n, 1), |(i, _)| -2.0 + 4.0 * i as f64 / (n - 1) as f64);
    let y = x.column(0).mapv(|v| v.sin());

    let mut svr = KernelRegressor::new(KernelConfig {
        gamma: 1.0,
        ..Default::default()
    });
    svr.fit(&x, &y).unwrap();

    assert!(svr.n_support() > 0);
    for (row, target) in x.rows().into_iter().zip(y.iter()) {
        // Residuals stay near the epsilon tube
        assert!((svr.predict_row(row).unwrap() - target).abs() < 0.25);
    }
}

#[test]
fn test_kernel_inside_tube_has_no_support_vectors() {
    // Every label within epsilon of zero: the zero function is optimal
    let x = array![[0.0], [1.0], [2.0]];
    let y = array![0.05, -0.05, 0.0];
    let mut svr = KernelRegressor::new(KernelConfig::default());
    svr.fit(&x, &y).unwrap();
    assert_eq!(svr.n_support(), 0);
    assert_eq!(svr.predict_row(array![1.5].view()).unwrap(), 0.0);
}

#[test]
fn test_regressor_serde_roundtrip_preserves_predictions() {
    let (x, y) = linear_data();
    let forest = ForestConfig {
        n_trees: 5,
        ..Default::default()
    };
    let kernel = KernelConfig::default();

    for variant in [Variant::Linear, Variant::RandomForest, Variant::Kernel] {
        let mut model = Regressor::for_variant(variant, &forest, &kernel);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.variant(), variant);

        let json = serde_json::to_vec(&model).unwrap();
        let restored: Regressor = serde_json::from_slice(&json).unwrap();
        let row = array![0.9, -0.2];
        let before = model.predict_row(row.view()).unwrap();
        let after = restored.predict_row(row.view()).unwrap();
        assert!((before - after).abs() < 1e-9, "{} drifted", model.name());
    }
}
