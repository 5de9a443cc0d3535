//! CSV-backed history provider
//!
//! Reads `<data_dir>/<SYMBOL>.csv` files in the common daily export layout
//! (`Date,Open,High,Low,Close,Volume`, extra columns ignored).

use super::{DateRange, HistoricalDataProvider};
use crate::error::{ForecastError, Result};
use crate::types::{check_symbol, Bar, PriceSeries};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "date")]
    date: NaiveDate,
    #[serde(rename = "Open", alias = "open")]
    open: f64,
    #[serde(rename = "High", alias = "high")]
    high: f64,
    #[serde(rename = "Low", alias = "low")]
    low: f64,
    #[serde(rename = "Close", alias = "close")]
    close: f64,
    #[serde(rename = "Volume", alias = "volume")]
    volume: f64,
}

impl From<CsvRow> for Bar {
    fn from(row: CsvRow) -> Self {
        Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// Loads daily history from CSV files on disk
#[derive(Debug, Clone)]
pub struct CsvDataProvider {
    data_dir: PathBuf,
}

impl CsvDataProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path_for(&self, symbol: &str) -> Result<PathBuf> {
        check_symbol(symbol)?;
        Ok(self.data_dir.join(format!("{}.csv", symbol.to_uppercase())))
    }

    /// Parse CSV bytes into bars sorted by date, duplicates dropped
    pub fn parse(bytes: &[u8]) -> Result<Vec<Bar>> {
        let mut reader = csv::Reader::from_reader(bytes);
        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            bars.push(Bar::from(row?));
        }
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[async_trait]
impl HistoricalDataProvider for CsvDataProvider {
    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries> {
        let path = self.path_for(symbol)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            ForecastError::Fetch(format!("{}: cannot read {}: {}", symbol, path.display(), e))
        })?;

        let bars: Vec<Bar> = Self::parse(&bytes)?
            .into_iter()
            .filter(|b| range.contains(b.date))
            .collect();

        tracing::debug!(
            "Loaded {} bars for {} from {} ({}..={})",
            bars.len(),
            symbol,
            path.display(),
            range.start,
            range.end
        );

        Ok(PriceSeries::new(symbol.to_uppercase(), bars))
    }

    fn name(&self) -> &str {
        "csv"
    }
}
