use rust_decimal::Decimal;
use tracing::{debug, info};

use super::results::SimulationResult;
use crate::error::{PipelineError, Result};
use crate::types::{LedgerEntry, Trade};

/// Replays a trade plan with the whole capital in every trade and the
/// proceeds reinvested in the next one. Fees, slippage and taxes are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioSimulator;

impl PortfolioSimulator {
    pub fn new() -> Self {
        Self
    }

    pub fn simulate(&self, trades: &[Trade], initial_capital: Decimal) -> Result<SimulationResult> {
        if initial_capital <= Decimal::ZERO {
            return Err(PipelineError::InvalidInvestment {
                amount: initial_capital,
                min: Decimal::ZERO,
                max: Decimal::MAX,
            });
        }

        let mut capital = initial_capital;
        let mut ledger = Vec::with_capacity(trades.len());

        for trade in trades {
            let buy = to_decimal(trade.buy_price)?;
            let sell = to_decimal(trade.sell_price)?;
            if buy <= Decimal::ZERO {
                return Err(PipelineError::InvalidSeries(format!(
                    "buy price {} on {} is not positive",
                    trade.buy_price, trade.buy_date
                )));
            }

            let shares = capital
                .checked_div(buy)
                .ok_or_else(|| overflow("shares", trade))?;
            let profit = (sell - buy)
                .checked_mul(shares)
                .ok_or_else(|| overflow("profit", trade))?;
            capital = shares
                .checked_mul(sell)
                .ok_or_else(|| overflow("capital", trade))?;

            debug!(
                "{} buy @ {:.2} -> {} sell @ {:.2}: {:.4} shares, profit {:.2}, capital {:.2}",
                trade.buy_date, buy, trade.sell_date, sell, shares, profit, capital
            );

            ledger.push(LedgerEntry {
                trade: trade.clone(),
                shares,
                profit,
                capital_after: capital,
            });
        }

        let result = SimulationResult::from_ledger(initial_capital, capital, ledger)?;
        info!(
            "Simulated {} trades: {:.2} -> {:.2} ({:.2}%)",
            result.total_trades, result.initial_capital, result.final_capital, result.roi_pct
        );
        Ok(result)
    }
}

fn overflow(what: &str, trade: &Trade) -> PipelineError {
    PipelineError::Overflow(format!(
        "{} out of range for trade {} @ {} -> {} @ {}",
        what, trade.buy_date, trade.buy_price, trade.sell_date, trade.sell_price
    ))
}

fn to_decimal(price: f64) -> Result<Decimal> {
    Decimal::try_from(price)
        .map_err(|e| PipelineError::InvalidSeries(format!("price {} not representable: {}", price, e)))
}
