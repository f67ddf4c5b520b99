use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single predicted close on a future business day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_price: f64,
}

/// A buy at a local minimum followed by a sell at the next local maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub buy_index: usize,
    pub buy_date: NaiveDate,
    pub buy_price: f64,
    pub sell_index: usize,
    pub sell_date: NaiveDate,
    pub sell_price: f64,
}

impl Trade {
    pub fn gain_pct(&self) -> f64 {
        (self.sell_price - self.buy_price) / self.buy_price * 100.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.sell_date - self.buy_date).num_days()
    }
}

/// A trade replayed against the running capital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub trade: Trade,
    pub shares: Decimal,
    pub profit: Decimal,
    pub capital_after: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Trade,
    HoldCash,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Trade => "Follow Trading Plan",
            Recommendation::HoldCash => "Hold Cash",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Currency used to display amounts for a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
}

impl Currency {
    pub const DEFAULT_CODE: &'static str = "INR";

    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into().to_uppercase() }
    }

    pub fn from_code(code: Option<&str>) -> Self {
        Self::new(code.unwrap_or(Self::DEFAULT_CODE))
    }

    pub fn symbol(&self) -> String {
        let known = match self.code.as_str() {
            "INR" => "₹",
            "USD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            "JPY" | "CNY" => "¥",
            "CAD" => "C$",
            "AUD" => "A$",
            "CHF" => "Fr.",
            "SGD" => "S$",
            "HKD" => "HK$",
            _ => return format!("{} ", self.code),
        };
        known.to_string()
    }

    pub fn format(&self, amount: Decimal) -> String {
        format!("{}{:.2}", self.symbol(), amount)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CODE)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_symbols() {
        assert_eq!(Currency::new("usd").symbol(), "$");
        assert_eq!(Currency::new("JPY").symbol(), "¥");
        assert_eq!(Currency::new("SEK").symbol(), "SEK ");
        assert_eq!(Currency::from_code(None).symbol(), "₹");
    }

    #[test]
    fn test_currency_format() {
        assert_eq!(Currency::new("USD").format(dec!(1100)), "$1100.00");
    }

    #[test]
    fn test_trade_gain() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let trade = Trade {
            buy_index: 0,
            buy_date: day,
            buy_price: 100.0,
            sell_index: 3,
            sell_date: day + chrono::Duration::days(3),
            sell_price: 110.0,
        };
        assert!((trade.gain_pct() - 10.0).abs() < 1e-9);
        assert_eq!(trade.holding_days(), 3);
    }
}
