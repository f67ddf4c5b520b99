pub mod yahoo;
pub mod resolver;
pub mod csv_source;

pub use yahoo::YahooFinanceClient;
pub use resolver::{FallbackResolver, StaticTickerMap};
pub use csv_source::CsvPriceSource;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::PriceHistory;

/// Daily closing prices for a symbol up to and including `end_date`.
/// An empty series is a valid answer; the pipeline reports it as no data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    async fn fetch(&self, symbol: &str, end_date: NaiveDate) -> Result<PriceHistory>;
}

/// Maps a company name to a ticker symbol.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TickerResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Option<String>>;
}
