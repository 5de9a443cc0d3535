//! Engine tests against a mocked data provider

use super::*;
use crate::data::MockHistoricalDataProvider;
use crate::error::ForecastError;
use crate::ml::AlgorithmOutcome;
use crate::sentiment::SentimentLabel;
use crate::store::MemoryArtifactStore;
use crate::types::PriceSeries;
use chrono::Duration;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn trend(n: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|t| Bar::synthetic(start + Duration::days(t as i64), 100.0 + 0.5 * t as f64, 5_000.0))
        .collect()
}

fn provider_with(bars: Vec<Bar>) -> Arc<dyn HistoricalDataProvider> {
    let mut mock = MockHistoricalDataProvider::new();
    mock.expect_fetch()
        .returning(move |symbol, _| Ok(PriceSeries::new(symbol.to_uppercase(), bars.clone())));
    Arc::new(mock)
}

fn failing_provider() -> Arc<dyn HistoricalDataProvider> {
    let mut mock = MockHistoricalDataProvider::new();
    mock.expect_fetch()
        .returning(|_, _| Err(ForecastError::Fetch("connection refused".into())));
    Arc::new(mock)
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.forest.n_trees = 8;
    config.kernel.max_epochs = 200;
    config
}

fn engine(provider: Arc<dyn HistoricalDataProvider>, store: &Arc<MemoryArtifactStore>) -> ForecastEngine {
    ForecastEngine::new(provider, store.clone(), test_config())
}

#[test]
fn test_placeholder_metrics_in_band() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let m = ModelMetrics::placeholder(&mut rng);
        assert!((0.85..=0.95).contains(&m.accuracy));
        assert!((0.75..=0.95).contains(&m.confidence));
        assert_eq!(m.source, MetricsSource::Placeholder);
        assert_eq!((m.accuracy * 1000.0).round() / 1000.0, m.accuracy);
    }
}

#[test]
fn test_metrics_from_report() {
    let report = TrainingReport {
        samples: 100,
        train_rows: 80,
        test_rows: 20,
        holdout_mae: Some(1.5),
        holdout_mape: Some(2.5),
        holdout_r2: Some(1.2),
    };
    let metrics = ModelMetrics::from_report(&report).unwrap();
    assert_eq!(metrics.accuracy, 0.975);
    assert_eq!(metrics.confidence, 1.0);
    assert_eq!(metrics.source, MetricsSource::Holdout);

    let empty = TrainingReport {
        holdout_mape: None,
        ..report
    };
    assert!(ModelMetrics::from_report(&empty).is_none());
}

#[tokio::test]
async fn test_predict_returns_bundle() {
    let store = Arc::new(MemoryArtifactStore::new());
    let engine = engine(provider_with(trend(120)), &store);
    let sentiment = SentimentSummary::from_scores(&[0.4, 0.2]);

    let bundle = engine
        .predict("aapl", Algorithm::LinearRegression, 10, Some(sentiment))
        .await
        .unwrap();

    assert_eq!(bundle.symbol, "AAPL");
    assert_eq!(bundle.algorithm, Algorithm::LinearRegression);
    assert_eq!(bundle.predictions.len(), 10);
    assert_eq!(bundle.model_metrics.source, MetricsSource::Placeholder);
    assert_eq!(bundle.sentiment.unwrap().label, SentimentLabel::Positive);

    // Second call reuses the stored models
    let writes = store.writes();
    engine
        .predict("AAPL", Algorithm::LinearRegression, 3, None)
        .await
        .unwrap();
    assert_eq!(store.writes(), writes);
}

#[tokio::test]
async fn test_predict_with_holdout_metrics() {
    let store = Arc::new(MemoryArtifactStore::new());
    let mut config = test_config();
    config.engine.metrics_source = MetricsSource::Holdout;
    let engine = ForecastEngine::new(provider_with(trend(120)), store.clone(), config);

    let bundle = engine
        .predict("AAPL", Algorithm::LinearRegression, 5, None)
        .await
        .unwrap();
    assert_eq!(bundle.model_metrics.source, MetricsSource::Holdout);
    assert!(bundle.model_metrics.accuracy > 0.99);
}

#[tokio::test]
async fn test_train_reports_split() {
    let store = Arc::new(MemoryArtifactStore::new());
    let engine = engine(provider_with(trend(60)), &store);

    let report = engine.train("AAPL", Algorithm::Svm).await.unwrap();
    assert_eq!(report.samples, 55);
    assert_eq!(report.train_rows + report.test_rows, 55);
    assert!(!store.is_empty());
}

#[tokio::test]
async fn test_short_history_trains_nothing() {
    let store = Arc::new(MemoryArtifactStore::new());
    let engine = engine(provider_with(trend(8)), &store);

    assert!(engine.train("AAPL", Algorithm::Ensemble).await.is_none());
    assert!(engine
        .predict("AAPL", Algorithm::Ensemble, 5, None)
        .await
        .is_none());
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_fetch_failure_is_absence() {
    let store = Arc::new(MemoryArtifactStore::new());
    let engine = engine(failing_provider(), &store);

    assert!(engine.train("AAPL", Algorithm::Svm).await.is_none());
    assert!(engine
        .predict("AAPL", Algorithm::Svm, 5, None)
        .await
        .is_none());
    assert!(engine.indicators("AAPL").await.is_none());

    let report = engine.compare("AAPL").await;
    assert!(report.records().is_empty());
    assert_eq!(
        report.outcome(Algorithm::Ensemble),
        Some(&AlgorithmOutcome::Skipped {
            reason: SkipReason::InsufficientHistory
        })
    );
}

#[tokio::test]
async fn test_empty_series_is_absence() {
    let store = Arc::new(MemoryArtifactStore::new());
    let engine = engine(provider_with(Vec::new()), &store);
    assert!(engine
        .predict("AAPL", Algorithm::RandomForest, 5, None)
        .await
        .is_none());
}

#[tokio::test]
async fn test_compare_scores_algorithms() {
    let store = Arc::new(MemoryArtifactStore::new());
    let engine = engine(provider_with(trend(80)), &store);

    let report = engine.compare("AAPL").await;
    let records = report.records();
    assert_eq!(records.len(), 4);
    let linear = records[&Algorithm::LinearRegression];
    assert!(linear.mape < 1.0);
}

#[test]
fn test_indicators_snapshot() {
    let store = Arc::new(MemoryArtifactStore::new());
    let engine = engine(provider_with(trend(60)), &store);

    let snapshot = tokio_test::block_on(engine.indicators("AAPL")).unwrap();
    assert_eq!(snapshot.rsi, 100.0);
    assert!(snapshot.sma_50 > 0.0);
    assert_eq!(snapshot.sma_200, 0.0);
}
