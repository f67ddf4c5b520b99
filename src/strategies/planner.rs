use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::types::{ForecastPoint, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    SeekingMin,
    SeekingMax,
}

/// Splits a forecast into long trades between local minima and the maxima
/// that follow them.
///
/// Equal neighbouring prices extend whichever side is currently being
/// searched, so flat runs never start or end a trade. Unprofitable candidates
/// are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TradePlanner;

impl TradePlanner {
    pub fn new() -> Self {
        Self
    }

    /// Fewer than two points cannot form a trade and yield `InsufficientData`.
    pub fn plan(&self, forecast: &[ForecastPoint]) -> Result<Vec<Trade>> {
        let n = forecast.len();
        if n < 2 {
            return Err(PipelineError::InsufficientData { required: 1, actual: n });
        }

        let price = |i: usize| forecast[i].predicted_price;
        let mut trades = Vec::new();
        let mut phase = Phase::SeekingMin;
        let mut i = 0;
        let mut buy = 0;

        while i < n - 1 {
            match phase {
                Phase::SeekingMin => {
                    while i < n - 1 && price(i + 1) <= price(i) {
                        i += 1;
                    }
                    if i == n - 1 {
                        break;
                    }
                    buy = i;
                    phase = Phase::SeekingMax;
                }
                Phase::SeekingMax => {
                    let mut j = buy + 1;
                    while j < n && price(j) >= price(j - 1) {
                        j += 1;
                    }
                    let sell = j - 1;

                    if price(sell) > price(buy) {
                        trades.push(Trade {
                            buy_index: buy,
                            buy_date: forecast[buy].date,
                            buy_price: price(buy),
                            sell_index: sell,
                            sell_date: forecast[sell].date,
                            sell_price: price(sell),
                        });
                    }

                    i = sell;
                    phase = Phase::SeekingMin;
                }
            }
        }

        debug!("Planned {} trades over {} forecast points", trades.len(), n);
        Ok(trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn forecast(prices: &[f64]) -> Vec<ForecastPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| ForecastPoint { date: start + Duration::days(i as i64), predicted_price: *p })
            .collect()
    }

    fn indices(trades: &[Trade]) -> Vec<(usize, usize)> {
        trades.iter().map(|t| (t.buy_index, t.sell_index)).collect()
    }

    #[test]
    fn test_alternating_extrema() {
        let trades = TradePlanner::new().plan(&forecast(&[10.0, 12.0, 9.0, 14.0, 8.0])).unwrap();

        assert_eq!(indices(&trades), vec![(0, 1), (2, 3)]);
        assert_eq!(trades[0].buy_price, 10.0);
        assert_eq!(trades[0].sell_price, 12.0);
        assert_eq!(trades[1].buy_price, 9.0);
        assert_eq!(trades[1].sell_price, 14.0);
    }

    #[test]
    fn test_flat_forecast_has_no_trades() {
        let trades = TradePlanner::new().plan(&forecast(&[10.0, 10.0, 10.0, 10.0])).unwrap();
        assert!(trades.is_empty());
    }

    #[test]
    fn test_falling_forecast_has_no_trades() {
        let trades = TradePlanner::new().plan(&forecast(&[5.0, 4.0, 3.0, 2.0])).unwrap();
        assert!(trades.is_empty());
    }

    #[test]
    fn test_plateaus_absorbed() {
        // flat bottom then flat top: one trade from the last low to the last high
        let trades = TradePlanner::new()
            .plan(&forecast(&[10.0, 9.0, 9.0, 11.0, 11.0, 7.0]))
            .unwrap();
        assert_eq!(indices(&trades), vec![(2, 4)]);
    }

    #[test]
    fn test_rising_to_end() {
        let trades = TradePlanner::new().plan(&forecast(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(indices(&trades), vec![(0, 2)]);
    }

    #[test]
    fn test_every_trade_profitable_and_ordered() {
        let prices = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0, 5.0, 8.0, 9.0, 7.0, 9.0];
        let trades = TradePlanner::new().plan(&forecast(&prices)).unwrap();

        assert!(!trades.is_empty());
        for t in &trades {
            assert!(t.sell_price > t.buy_price);
            assert!(t.sell_index > t.buy_index);
            assert!(t.sell_date > t.buy_date);
        }
        for pair in trades.windows(2) {
            assert!(pair[1].buy_index >= pair[0].sell_index);
        }
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            TradePlanner::new().plan(&forecast(&[10.0])),
            Err(PipelineError::InsufficientData { .. })
        ));
        assert!(TradePlanner::new().plan(&[]).is_err());
    }
}
