use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::ml::DEFAULT_WINDOW_SIZE;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub forecast: ForecastSettings,
    pub investment: InvestmentSettings,
    pub data: DataSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            forecast: ForecastSettings::default(),
            investment: InvestmentSettings::default(),
            data: DataSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Forecast validation
        if self.forecast.window_size == 0 {
            errors.push("window_size must be > 0".to_string());
        }
        if self.forecast.horizon == 0 {
            errors.push("horizon must be > 0".to_string());
        }
        if self.forecast.smoothing_window > self.forecast.horizon {
            errors.push("smoothing_window must be <= horizon".to_string());
        }
        if !(self.forecast.train_split > 0.0 && self.forecast.train_split < 1.0) {
            errors.push("train_split must be between 0 and 1 (exclusive)".to_string());
        }
        let (lo, hi) = self.forecast.feature_range;
        if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
            errors.push("feature_range must be finite with min < max".to_string());
        }

        // Investment validation
        if self.investment.min <= Decimal::ZERO {
            errors.push("investment.min must be > 0".to_string());
        }
        if self.investment.min > self.investment.max {
            errors.push("investment.min must be <= investment.max".to_string());
        }
        if self.investment.default < self.investment.min || self.investment.default > self.investment.max {
            errors.push("investment.default must lie within [min, max]".to_string());
        }

        // Data validation
        if self.data.database_url.trim().is_empty() {
            errors.push("data.database_url must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    pub window_size: usize,
    pub horizon: usize,
    pub smoothing_window: usize,
    pub train_split: f64,
    pub feature_range: (f64, f64),
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            horizon: 30,
            smoothing_window: 3,
            train_split: 0.80,
            feature_range: (0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentSettings {
    pub min: Decimal,
    pub max: Decimal,
    pub default: Decimal,
}

impl Default for InvestmentSettings {
    fn default() -> Self {
        Self {
            min: dec!(1000),
            max: dec!(10000000),
            default: dec!(1000),
        }
    }
}

impl InvestmentSettings {
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && amount <= self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub database_url: String,
    pub yahoo_base_url: String,
    pub yahoo_search_url: String,
    pub user_agent: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./forecast_history.db".to_string(),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            yahoo_search_url: "https://query2.finance.yahoo.com".to_string(),
            user_agent: "Mozilla/5.0 (compatible; price-forecast-planner/0.1)".to_string(),
        }
    }
}
