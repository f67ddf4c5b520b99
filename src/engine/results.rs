use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::types::{Currency, LedgerEntry, Recommendation};

/// Outcome of replaying a trade plan against a starting investment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    pub total_profit: Decimal,
    pub roi_pct: Decimal,

    // Trade Statistics
    pub total_trades: u64,
    pub largest_profit: Decimal,
    pub average_gain_pct: Decimal,
    pub days_in_market: i64,

    pub recommendation: Recommendation,
    pub ledger: Vec<LedgerEntry>,
}

impl SimulationResult {
    pub fn from_ledger(
        initial_capital: Decimal,
        final_capital: Decimal,
        ledger: Vec<LedgerEntry>,
    ) -> Result<Self> {
        let total_profit = final_capital - initial_capital;
        let roi_pct = if !initial_capital.is_zero() {
            total_profit
                .checked_div(initial_capital)
                .and_then(|r| r.checked_mul(dec!(100)))
                .ok_or_else(|| PipelineError::Overflow(format!("ROI of {} on {}", total_profit, initial_capital)))?
        } else {
            Decimal::ZERO
        };

        let total_trades = ledger.len() as u64;
        let largest_profit = ledger
            .iter()
            .map(|e| e.profit)
            .max()
            .unwrap_or(Decimal::ZERO);

        let average_gain_pct = if total_trades > 0 {
            let sum: f64 = ledger.iter().map(|e| e.trade.gain_pct()).sum();
            let avg = sum / total_trades as f64;
            Decimal::try_from(avg)
                .map_err(|e| PipelineError::Overflow(format!("average gain {}%: {}", avg, e)))?
        } else {
            Decimal::ZERO
        };

        let days_in_market = ledger.iter().map(|e| e.trade.holding_days()).sum();

        let recommendation = if ledger.is_empty() {
            Recommendation::HoldCash
        } else {
            Recommendation::Trade
        };

        Ok(Self {
            initial_capital,
            final_capital,
            total_profit,
            roi_pct,
            total_trades,
            largest_profit,
            average_gain_pct,
            days_in_market,
            recommendation,
            ledger,
        })
    }

    /// Pretty print the plan and totals to console
    pub fn print_summary(&self, currency: &Currency) {
        let sym = currency.symbol();

        println!("\n{}", "=".repeat(96));
        println!("                              RECOMMENDED TRADING PLAN");
        println!("{}", "=".repeat(96));

        if self.ledger.is_empty() {
            println!("No profitable trading opportunities found in the prediction window");
            println!("Recommended Action: {}", self.recommendation);
        } else {
            println!(
                "{:<12} {:>12} {:<12} {:>12} {:>14} {:>14} {:>14}",
                "Buy Date", "Buy Price", "Sell Date", "Sell Price", "Shares", "Profit", "Total Value"
            );
            println!("{}", "-".repeat(96));
            for e in &self.ledger {
                println!(
                    "{:<12} {:>12} {:<12} {:>12} {:>14.4} {:>14.2} {:>14.2}",
                    e.trade.buy_date.format("%Y-%m-%d"),
                    format!("{}{:.2}", sym, e.trade.buy_price),
                    e.trade.sell_date.format("%Y-%m-%d"),
                    format!("{}{:.2}", sym, e.trade.sell_price),
                    e.shares,
                    e.profit,
                    e.capital_after,
                );
            }
        }

        println!("{}", "-".repeat(96));
        println!("FINAL RESULTS");
        println!("  Initial Investment: {}", currency.format(self.initial_capital));
        println!("  Final Value:        {}", currency.format(self.final_capital));
        println!(
            "  Total Profit:       {} ({:.1}%)",
            currency.format(self.total_profit),
            self.roi_pct
        );
        if self.total_trades > 0 {
            println!("  Trades:             {} ({} days in market)", self.total_trades, self.days_in_market);
            println!("  Average Gain:       {:.2}%", self.average_gain_pct);
        }
        println!("{}", "=".repeat(96));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trade;
    use chrono::NaiveDate;

    fn entry(buy: f64, sell: f64, profit: Decimal, capital_after: Decimal) -> LedgerEntry {
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        LedgerEntry {
            trade: Trade {
                buy_index: 0,
                buy_date: day,
                buy_price: buy,
                sell_index: 2,
                sell_date: day + chrono::Duration::days(2),
                sell_price: sell,
            },
            shares: Decimal::ONE,
            profit,
            capital_after,
        }
    }

    #[test]
    fn test_aggregates() {
        let ledger = vec![
            entry(100.0, 110.0, dec!(100), dec!(1100)),
            entry(100.0, 120.0, dec!(220), dec!(1320)),
        ];
        let result = SimulationResult::from_ledger(dec!(1000), dec!(1320), ledger).unwrap();

        assert_eq!(result.total_trades, 2);
        assert_eq!(result.total_profit, dec!(320));
        assert_eq!(result.roi_pct, dec!(32));
        assert_eq!(result.largest_profit, dec!(220));
        assert_eq!(result.days_in_market, 4);
        assert!((result.average_gain_pct - dec!(15)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_unrepresentable_average_gain_is_an_error() {
        let ledger = vec![entry(1e-300, 1e300, dec!(1), dec!(1001))];
        let result = SimulationResult::from_ledger(dec!(1000), dec!(1001), ledger);
        assert!(matches!(result, Err(PipelineError::Overflow(_))));
    }

    #[test]
    fn test_serializes_for_rendering() {
        let result = SimulationResult::from_ledger(dec!(1000), dec!(1000), vec![]).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["recommendation"], "HoldCash");
        assert!(json["ledger"].as_array().unwrap().is_empty());
    }
}
