//! Historical market data
//!
//! The engine treats the data source as an opaque provider of daily OHLCV
//! history. An empty series means "no data" and is not an error; a failed
//! fetch surfaces as `ForecastError::Fetch`.

mod csv_provider;

pub use csv_provider::CsvDataProvider;

use crate::error::Result;
use crate::types::PriceSeries;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

/// Inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `years * 365` calendar days ending at `end`
    pub fn trailing_years(end: NaiveDate, years: u32) -> Self {
        Self::new(end - Duration::days(365 * i64::from(years)), end)
    }

    pub fn trailing_days(end: NaiveDate, days: i64) -> Self {
        Self::new(end - Duration::days(days), end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Source of historical price series
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoricalDataProvider: Send + Sync {
    /// Fetch the bars for `symbol` within `range`, oldest first
    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
