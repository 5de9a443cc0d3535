//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.workers, 4);
        assert!(config.preserve_chunk_lookback);
        assert_eq!(config.horizon_days, 30);
        assert_eq!(config.train_years, 2);
        assert_eq!(config.predict_years, 1);
        assert_eq!(config.metrics_source, MetricsSource::Placeholder);
    }

    #[test]
    fn test_model_configs_default() {
        let forest = ForestConfig::default();
        assert_eq!(forest.n_trees, 100);
        assert_eq!(forest.seed, 42);
        assert!(forest.max_depth.is_none());

        let kernel = KernelConfig::default();
        assert_eq!(kernel.c, 100.0);
        assert_eq!(kernel.gamma, 0.1);
        assert_eq!(kernel.epsilon, 0.1);

        let training = TrainingConfig::default();
        assert_eq!(training.min_rows, 10);
        assert_eq!(training.test_fraction, 0.2);
        assert_eq!(training.split_seed, 42);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine.workers, 4);
        assert_eq!(config.backtest.holdout_days, 30);
        assert_eq!(config.store.model_dir, PathBuf::from("models"));
        assert_eq!(config.data.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_partial_sections() {
        let toml_str = r#"
[engine]
workers = 8
metrics_source = "holdout"

[forest]
n_trees = 25
max_depth = 6
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.workers, 8);
        assert_eq!(config.engine.metrics_source, MetricsSource::Holdout);
        assert!(config.engine.preserve_chunk_lookback); // defaults to true
        assert_eq!(config.forest.n_trees, 25);
        assert_eq!(config.forest.max_depth, Some(6));
        assert_eq!(config.forest.min_samples_leaf, 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[store]
model_dir = "/tmp/forecast-models"

[backtest]
holdout_days = 20
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.store.model_dir, PathBuf::from("/tmp/forecast-models"));
        assert_eq!(config.backtest.holdout_days, 20);
        assert_eq!(config.kernel.max_epochs, 1000);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = Config::load("definitely-not-here.toml").unwrap();
        assert_eq!(config.engine.horizon_days, 30);
    }
}
