//! Stock Forecast CLI
//!
//! Trains models, forecasts prices and compares algorithms for a symbol
//! using CSV history from the configured data directory.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use stock_forecast::{
    config::Config,
    data::{CsvDataProvider, HistoricalDataProvider},
    engine::ForecastEngine,
    sentiment::SentimentSummary,
    store::FsArtifactStore,
    types::Algorithm,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stock-forecast")]
#[command(about = "Forecast stock prices and compare regression models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrain models for a symbol
    Train {
        symbol: String,
        /// linear_regression, random_forest, svm or ensemble
        #[arg(short, long, default_value = "ensemble")]
        algorithm: Algorithm,
    },
    /// Forecast the next days' closing prices
    Predict {
        symbol: String,
        #[arg(short, long, default_value = "ensemble")]
        algorithm: Algorithm,
        /// Forecast horizon (defaults to the configured horizon)
        #[arg(short, long)]
        days: Option<usize>,
        /// Compound news sentiment scores to attach
        #[arg(long, num_args = 1.., allow_negative_numbers = true)]
        sentiment: Vec<f64>,
    },
    /// Walk-forward comparison of all algorithms
    Compare { symbol: String },
    /// Technical indicator snapshot
    Indicators { symbol: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    let provider = CsvDataProvider::new(&config.data.data_dir);
    tracing::info!(
        "Using {} history from {}",
        provider.name(),
        provider.data_dir().display()
    );
    let store = FsArtifactStore::new(&config.store.model_dir);
    tracing::info!("Storing models under {}", store.root().display());
    let horizon = config.engine.horizon_days;
    let engine = ForecastEngine::new(Arc::new(provider), Arc::new(store), config);

    match cli.command {
        Commands::Train { symbol, algorithm } => {
            let report = engine.train(&symbol, algorithm).await;
            print_or_warn(report.as_ref(), &format!("could not train {} for {}", algorithm, symbol))
        }
        Commands::Predict {
            symbol,
            algorithm,
            days,
            sentiment,
        } => {
            let sentiment = (!sentiment.is_empty()).then(|| SentimentSummary::from_scores(&sentiment));
            let bundle = engine
                .predict(&symbol, algorithm, days.unwrap_or(horizon), sentiment)
                .await;
            print_or_warn(bundle.as_ref(), &format!("no predictions for {}", symbol))
        }
        Commands::Compare { symbol } => {
            let report = engine.compare(&symbol).await;
            if report.records().is_empty() {
                tracing::warn!("No algorithm could be scored for {}", symbol);
            }
            print_json(&report)
        }
        Commands::Indicators { symbol } => {
            let snapshot = engine.indicators(&symbol).await;
            print_or_warn(snapshot.as_ref(), &format!("no history for {}", symbol))
        }
    }
}

/// Absence is a warning, not a failure
fn print_or_warn<T: Serialize>(value: Option<&T>, warning: &str) -> anyhow::Result<()> {
    match value {
        Some(v) => print_json(v),
        None => {
            tracing::warn!("{}", warning);
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
