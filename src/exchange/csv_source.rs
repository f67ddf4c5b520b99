use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

use super::PriceHistorySource;
use crate::types::{PriceHistory, PricePoint, PriceSeries};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "date")]
    date: NaiveDate,
    #[serde(rename = "Close", alias = "close")]
    close: Option<f64>,
}

/// Offline price history from a `Date,Close` file (other columns ignored).
/// Rows with an empty close are skipped.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
    currency: Option<String>,
}

impl CsvPriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), currency: None }
    }

    pub fn with_currency(mut self, code: &str) -> Self {
        self.currency = Some(code.to_string());
        self
    }

    pub fn parse<R: Read>(reader: R) -> Result<PriceSeries> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut points = Vec::new();

        for (line, row) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| anyhow!("Bad CSV row {}: {}", line + 2, e))?;
            if let Some(close) = row.close {
                points.push(PricePoint::new(row.date, close));
            }
        }

        Ok(PriceSeries::new(points)?)
    }
}

#[async_trait]
impl PriceHistorySource for CsvPriceSource {
    async fn fetch(&self, symbol: &str, end_date: NaiveDate) -> Result<PriceHistory> {
        let path = self.path.clone();
        let mut series = tokio::task::spawn_blocking(move || {
            let file = std::fs::File::open(&path)
                .map_err(|e| anyhow!("Failed to open {}: {}", path.display(), e))?;
            Self::parse(file)
        })
        .await??;

        series.truncate_after(end_date);
        info!("Loaded {} closes for {} from {}", series.len(), symbol, self.path.display());

        Ok(PriceHistory {
            symbol: symbol.to_string(),
            currency: self.currency.clone(),
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_extra_columns_and_gaps() {
        let data = "Date,Open,Close,Volume\n\
                    2024-01-03,10,11.5,100\n\
                    2024-01-02,9,10.5,100\n\
                    2024-01-04,11,,0\n";
        let series = CsvPriceSource::parse(data.as_bytes()).unwrap();

        assert_eq!(series.closes(), vec![10.5, 11.5]);
    }

    #[test]
    fn test_parse_rejects_bad_rows() {
        let data = "Date,Close\nnot-a-date,1.0\n";
        assert!(CsvPriceSource::parse(data.as_bytes()).is_err());

        let data = "Date,Close\n2024-01-02,-3.0\n";
        assert!(CsvPriceSource::parse(data.as_bytes()).is_err());
    }

    #[tokio::test]
    async fn test_fetch_truncates_to_end_date() {
        let path = std::env::temp_dir().join(format!("closes-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, "date,close\n2024-01-02,1.0\n2024-01-03,2.0\n2024-01-04,3.0\n").unwrap();

        let source = CsvPriceSource::new(&path).with_currency("USD");
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let history = source.fetch("TEST", end).await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(history.series.closes(), vec![1.0, 2.0]);
        assert_eq!(history.currency.as_deref(), Some("USD"));
        assert_eq!(history.symbol, "TEST");
    }
}
