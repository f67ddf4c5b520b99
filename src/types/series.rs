use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Chronologically ascending closes with unique dates and positive finite prices.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, sorting by date. Rejects duplicate dates and
    /// non-positive or non-finite closes.
    pub fn new(mut points: Vec<PricePoint>) -> Result<Self> {
        points.sort_by_key(|p| p.date);

        for pair in points.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(PipelineError::InvalidSeries(format!(
                    "duplicate date {}",
                    pair[0].date
                )));
            }
        }

        if let Some(bad) = points.iter().find(|p| !p.close.is_finite() || p.close <= 0.0) {
            return Err(PipelineError::InvalidSeries(format!(
                "close {} on {} is not a positive finite price",
                bad.close, bad.date
            )));
        }

        Ok(Self { points })
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Drops every point after `end_date`.
    pub fn truncate_after(&mut self, end_date: NaiveDate) {
        self.points.retain(|p| p.date <= end_date);
    }

    /// Index where the holdout part begins: `floor(len * ratio)`.
    pub fn split_index(&self, ratio: f64) -> usize {
        ((self.points.len() as f64) * ratio).floor() as usize
    }
}

/// What a price source hands back for a symbol.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    pub symbol: String,
    /// ISO currency code reported by the source, if any.
    pub currency: Option<String>,
    pub series: PriceSeries,
}

impl PriceHistory {
    /// The answer for a symbol the source knows nothing about.
    pub fn empty(symbol: &str) -> Self {
        Self { symbol: symbol.to_string(), currency: None, series: PriceSeries::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_series_sorted_on_construction() {
        let series = PriceSeries::new(vec![
            PricePoint::new(day(3), 12.0),
            PricePoint::new(day(1), 10.0),
            PricePoint::new(day(2), 11.0),
        ])
        .unwrap();

        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
        assert_eq!(series.last_date(), Some(day(3)));
    }

    #[test]
    fn test_rejects_duplicates_and_bad_prices() {
        let dup = PriceSeries::new(vec![PricePoint::new(day(1), 10.0), PricePoint::new(day(1), 11.0)]);
        assert!(matches!(dup, Err(PipelineError::InvalidSeries(_))));

        let negative = PriceSeries::new(vec![PricePoint::new(day(1), -1.0)]);
        assert!(negative.is_err());

        let nan = PriceSeries::new(vec![PricePoint::new(day(1), f64::NAN)]);
        assert!(nan.is_err());
    }

    #[test]
    fn test_truncate_and_split() {
        let mut series = PriceSeries::new(
            (1..=10).map(|d| PricePoint::new(day(d), d as f64)).collect(),
        )
        .unwrap();

        assert_eq!(series.split_index(0.8), 8);

        series.truncate_after(day(5));
        assert_eq!(series.len(), 5);
        assert_eq!(series.last_date(), Some(day(5)));
        assert_eq!(series.closes().last(), Some(&5.0));
    }
}
