use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::results::SimulationResult;
use super::simulator::PortfolioSimulator;
use crate::database::{HistoryRecord, HistoryStore};
use crate::error::{PipelineError, Result};
use crate::exchange::{PriceHistorySource, TickerResolver};
use crate::indicators::MovingAverageSummary;
use crate::ml::{evaluate, ErrorMetrics, Forecaster, MinMaxScaler, Predictor, ScalerState, WindowBuilder};
use crate::settings::PipelineConfig;
use crate::strategies::TradePlanner;
use crate::types::{next_business_days, Currency, ForecastPoint, PriceSeries, Trade};

/// Everything one prediction request needs, passed explicitly through the run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub username: Option<String>,
    pub company_name: String,
    pub symbol: String,
    /// Forecast dates start on the first business day after this date.
    pub run_date: NaiveDate,
    /// Last date of price history to use.
    pub end_date: NaiveDate,
    pub investment: Decimal,
}

impl RunContext {
    pub fn new(company_name: &str, symbol: &str, investment: Decimal) -> Self {
        let today = Local::now().date_naive();
        Self {
            run_id: Uuid::new_v4(),
            username: None,
            company_name: company_name.to_string(),
            symbol: symbol.to_string(),
            run_date: today,
            end_date: today,
            investment,
        }
    }

    pub fn with_user(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = end_date;
        self
    }

    #[cfg(test)]
    pub fn with_run_date(mut self, run_date: NaiveDate) -> Self {
        self.run_date = run_date;
        self
    }
}

/// Stable output of a run: forecast table, trade ledger and summary metrics.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub company_name: String,
    pub symbol: String,
    pub currency: Currency,
    pub model: String,
    pub history_points: usize,
    pub history_end: Option<NaiveDate>,
    pub moving_averages: MovingAverageSummary,
    pub scaler: ScalerState,
    pub holdout: ErrorMetrics,
    pub forecast: Vec<ForecastPoint>,
    pub trades: Vec<Trade>,
    pub simulation: SimulationResult,
    /// Set when the plan could not be built and the run fell back to holding cash.
    pub advisory: Option<String>,
}

impl RunReport {
    pub fn print(&self) {
        let sym = self.currency.symbol();

        println!("\n{} ({}) - model '{}'", self.company_name, self.symbol, self.model);
        println!(
            "History: {} closes up to {}",
            self.history_points,
            self.history_end.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
        );
        if let Some(last) = self.moving_averages.last_close {
            println!("  Last close:   {}{:.2}", sym, last);
        }
        if let Some(ma) = self.moving_averages.ma_100 {
            println!("  100-day MA:   {}{:.2}", sym, ma);
        }
        if let Some(ma) = self.moving_averages.ma_200 {
            println!("  200-day MA:   {}{:.2}", sym, ma);
        }
        println!("Holdout accuracy: {}", self.holdout);

        println!("\nNext {} business days", self.forecast.len());
        println!("{:<12} {:>16}", "Date", "Predicted Price");
        for point in &self.forecast {
            println!("{:<12} {:>16}", point.date, format!("{}{:.2}", sym, point.predicted_price));
        }

        if let Some(advisory) = &self.advisory {
            println!("\n{}", advisory);
        }
        self.simulation.print_summary(&self.currency);
    }
}

/// The synchronous forecast-to-strategy core.
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: PipelineConfig,
    forecaster: Forecaster,
    planner: TradePlanner,
    simulator: PortfolioSimulator,
}

impl ForecastPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|errors| PipelineError::Config(errors.join(", ")))?;

        let forecaster = Forecaster::new(
            config.forecast.window_size,
            config.forecast.horizon,
            config.forecast.smoothing_window,
        );

        Ok(Self {
            config,
            forecaster,
            planner: TradePlanner::new(),
            simulator: PortfolioSimulator::new(),
        })
    }

    pub fn check_investment(&self, amount: Decimal) -> Result<()> {
        let bounds = &self.config.investment;
        if !bounds.contains(amount) {
            return Err(PipelineError::InvalidInvestment { amount, min: bounds.min, max: bounds.max });
        }
        Ok(())
    }

    pub fn run(
        &self,
        ctx: &RunContext,
        series: &PriceSeries,
        currency: Currency,
        predictor: &mut dyn Predictor,
    ) -> Result<RunReport> {
        self.check_investment(ctx.investment)?;

        if series.is_empty() {
            return Err(PipelineError::NoData(Some(ctx.symbol.clone())));
        }

        let window_size = self.config.forecast.window_size;
        let closes = series.closes();
        if closes.len() <= window_size {
            return Err(PipelineError::InsufficientData { required: window_size, actual: closes.len() });
        }

        // Context = last training window + holdout tail
        let split = series.split_index(self.config.forecast.train_split);
        let start = split.saturating_sub(window_size);
        let context = &closes[start..];
        debug!(
            "[{}] {} closes, split at {}, context {}..{}",
            ctx.run_id,
            closes.len(),
            split,
            start,
            closes.len()
        );

        let (lo, hi) = self.config.forecast.feature_range;
        let mut scaler = MinMaxScaler::with_range(lo, hi)?;
        let scaled = scaler.fit_transform(context)?;
        let scaler_state = scaler.state().ok_or(PipelineError::NotFitted)?;

        let windows = WindowBuilder::build(&scaled, window_size)?;
        let holdout = evaluate(&windows, predictor, &scaler)?;
        info!("[{}] Holdout accuracy for {}: {}", ctx.run_id, ctx.symbol, holdout);

        let prices = self.forecaster.forecast(windows.last_window(), predictor, &scaler)?;
        let dates = next_business_days(ctx.run_date, prices.len());
        let forecast: Vec<ForecastPoint> = dates
            .into_iter()
            .zip(prices)
            .map(|(date, predicted_price)| ForecastPoint { date, predicted_price })
            .collect();

        let (trades, advisory) = match self.planner.plan(&forecast) {
            Ok(trades) => (trades, None),
            Err(e @ PipelineError::InsufficientData { .. }) => {
                warn!("[{}] {}", ctx.run_id, e);
                (Vec::new(), Some(e.advisory().to_string()))
            }
            Err(e) => return Err(e),
        };

        let simulation = self.simulator.simulate(&trades, ctx.investment)?;

        Ok(RunReport {
            run_id: ctx.run_id,
            company_name: ctx.company_name.clone(),
            symbol: ctx.symbol.clone(),
            currency,
            model: predictor.name().to_string(),
            history_points: closes.len(),
            history_end: series.last_date(),
            moving_averages: MovingAverageSummary::from_closes(&closes),
            scaler: scaler_state,
            holdout,
            forecast,
            trades,
            simulation,
            advisory,
        })
    }
}

/// Runs the core against the external collaborators for one request.
pub struct PredictionService {
    pipeline: ForecastPipeline,
    source: Arc<dyn PriceHistorySource>,
    resolver: Arc<dyn TickerResolver>,
    store: Option<Arc<dyn HistoryStore>>,
}

impl PredictionService {
    pub fn new(
        pipeline: ForecastPipeline,
        source: Arc<dyn PriceHistorySource>,
        resolver: Arc<dyn TickerResolver>,
    ) -> Self {
        Self { pipeline, source, resolver, store: None }
    }

    pub fn with_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn resolve(&self, company_name: &str) -> Result<String> {
        match self.resolver.resolve(company_name).await {
            Ok(Some(symbol)) => {
                info!("Resolved '{}' to {}", company_name, symbol);
                Ok(symbol)
            }
            Ok(None) => Err(PipelineError::Resolution(company_name.to_string())),
            Err(e) => {
                warn!("Ticker resolution for '{}' failed: {}", company_name, e);
                Err(PipelineError::Resolution(company_name.to_string()))
            }
        }
    }

    pub async fn run(&self, ctx: &RunContext, predictor: &mut dyn Predictor) -> anyhow::Result<RunReport> {
        info!("[{}] Prediction run for {} ({})", ctx.run_id, ctx.company_name, ctx.symbol);
        self.pipeline.check_investment(ctx.investment)?;

        let history = self.source.fetch(&ctx.symbol, ctx.end_date).await?;
        if history.series.is_empty() {
            return Err(PipelineError::NoData(Some(history.symbol)).into());
        }
        let currency = Currency::from_code(history.currency.as_deref());

        let report = self.pipeline.run(ctx, &history.series, currency, predictor)?;

        if !report.trades.is_empty() {
            self.record(ctx, &report).await;
        }

        Ok(report)
    }

    async fn record(&self, ctx: &RunContext, report: &RunReport) {
        let (Some(store), Some(username)) = (&self.store, &ctx.username) else {
            return;
        };

        let record = HistoryRecord {
            username: username.clone(),
            company_name: ctx.company_name.clone(),
            ticker: ctx.symbol.clone(),
            investment: report.simulation.initial_capital,
            final_value: report.simulation.final_capital,
            total_profit: report.simulation.total_profit,
            recorded_at: chrono::Utc::now(),
        };

        if let Err(e) = store.record(&record).await {
            warn!("[{}] Failed to save history: {}", ctx.run_id, e);
        }
    }
}
