mod types;
mod error;
mod indicators;
mod strategies;
mod exchange;
mod engine;
mod settings;
mod database;
mod ml;

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use database::{HistoryStore, SqliteHistoryStore};
use engine::{ForecastPipeline, PredictionService, RunContext};
use error::PipelineError;
use exchange::{CsvPriceSource, FallbackResolver, PriceHistorySource, YahooFinanceClient};
use ml::{LinearPredictor, PersistencePredictor, Predictor};
use settings::PipelineConfig;

#[derive(Parser)]
#[command(name = "price-forecast-planner")]
#[command(version = "0.1.0")]
#[command(about = "Forecast a stock's next 30 business days and plan buy/sell trades on the forecast", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to ./forecast.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast prices, plan trades and simulate the investment
    Predict {
        /// Company name, resolved to a ticker
        #[arg(long, required_unless_present = "ticker")]
        company: Option<String>,
        /// Ticker symbol, skips resolution (e.g. TCS.NS, AAPL)
        #[arg(short, long)]
        ticker: Option<String>,
        /// Amount to invest (defaults to the configured default)
        #[arg(short, long)]
        investment: Option<Decimal>,
        /// Last history date to use (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        end_date: Option<NaiveDate>,
        /// Pretrained model: .json linear weights, or .onnx with the onnx feature
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Read closes from a Date,Close CSV file instead of Yahoo Finance
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Currency code for CSV input
        #[arg(long, requires = "csv")]
        currency: Option<String>,
        /// Record the result in this user's history
        #[arg(short, long)]
        user: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Do not write to the history database
        #[arg(long)]
        no_record: bool,
    },
    /// Look up the ticker for a company name
    Resolve {
        name: String,
    },
    /// Show a user's past prediction runs
    History {
        #[arg(short, long)]
        user: String,
    },
    /// Write the default configuration as TOML
    InitConfig {
        /// Output file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

struct PredictArgs {
    company: Option<String>,
    ticker: Option<String>,
    investment: Option<Decimal>,
    end_date: Option<NaiveDate>,
    model: Option<PathBuf>,
    csv: Option<PathBuf>,
    currency: Option<String>,
    user: Option<String>,
    json: bool,
    no_record: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::InitConfig { output } => {
            write_default_config(output.as_deref())?;
        }
        Commands::Resolve { name } => {
            let config = settings::load(cli.config.as_deref())?;
            resolve_company(&config, &name).await?;
        }
        Commands::History { user } => {
            let config = settings::load(cli.config.as_deref())?;
            show_history(&config, &user).await?;
        }
        Commands::Predict {
            company,
            ticker,
            investment,
            end_date,
            model,
            csv,
            currency,
            user,
            json,
            no_record,
        } => {
            let config = settings::load(cli.config.as_deref())?;
            let args = PredictArgs {
                company,
                ticker,
                investment,
                end_date,
                model,
                csv,
                currency,
                user,
                json,
                no_record,
            };
            if let Err(e) = run_prediction(config, args).await {
                if let Some(pe) = e.downcast_ref::<PipelineError>() {
                    error!("{}", pe.advisory());
                }
                return Err(e);
            }
        }
    }

    Ok(())
}

fn write_default_config(output: Option<&Path>) -> Result<()> {
    let rendered = settings::default_toml()?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!("Wrote default configuration to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

async fn resolve_company(config: &PipelineConfig, name: &str) -> Result<()> {
    let yahoo = YahooFinanceClient::new(&config.data)?;
    let pipeline = ForecastPipeline::new(config.clone())?;
    let resolver = Arc::new(FallbackResolver::new(yahoo.clone()));
    let service = PredictionService::new(pipeline, Arc::new(yahoo), resolver);

    let symbol = service.resolve(name).await?;
    println!("{} -> {}", name.trim(), symbol);
    Ok(())
}

async fn show_history(config: &PipelineConfig, user: &str) -> Result<()> {
    let store = SqliteHistoryStore::new(&config.data.database_url).await?;
    let records = store.history(user).await?;

    if records.is_empty() {
        println!("No history for {}", user);
        return Ok(());
    }

    println!("\n=== History for {} ===", user);
    println!(
        "{:<20} {:<24} {:<14} {:>14} {:>14} {:>14}",
        "Timestamp", "Company", "Ticker", "Investment", "Final Value", "Profit"
    );
    for r in &records {
        println!(
            "{:<20} {:<24} {:<14} {:>14.2} {:>14.2} {:>14.2}",
            r.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            r.company_name,
            r.ticker,
            r.investment,
            r.final_value,
            r.total_profit
        );
    }
    Ok(())
}

async fn run_prediction(config: PipelineConfig, args: PredictArgs) -> Result<()> {
    let window_size = config.forecast.window_size;
    let investment = args.investment.unwrap_or(config.investment.default);

    let yahoo = YahooFinanceClient::new(&config.data)?;
    let source: Arc<dyn PriceHistorySource> = match &args.csv {
        Some(path) => {
            let mut csv = CsvPriceSource::new(path);
            if let Some(code) = &args.currency {
                csv = csv.with_currency(code);
            }
            Arc::new(csv)
        }
        None => Arc::new(yahoo.clone()),
    };
    let resolver = Arc::new(FallbackResolver::new(yahoo));

    let pipeline = ForecastPipeline::new(config.clone())?;
    pipeline.check_investment(investment)?;

    let mut service = PredictionService::new(pipeline, source, resolver);
    if args.user.is_some() && !args.no_record {
        match SqliteHistoryStore::new(&config.data.database_url).await {
            Ok(store) => service = service.with_store(Arc::new(store)),
            Err(e) => warn!("History database unavailable, results will not be saved: {}", e),
        }
    }

    let (company_name, symbol) = match (&args.company, &args.ticker) {
        (company, Some(ticker)) => {
            let symbol = ticker.trim().to_uppercase();
            (company.clone().unwrap_or_else(|| symbol.clone()), symbol)
        }
        (Some(company), None) => (company.trim().to_string(), service.resolve(company).await?),
        (None, None) => return Err(anyhow!("Either --company or --ticker is required")),
    };

    let mut predictor = load_predictor(args.model.as_deref(), window_size)?;

    let mut ctx = RunContext::new(&company_name, &symbol, investment)
        .with_end_date(args.end_date.unwrap_or_else(|| Local::now().date_naive()));
    if let Some(user) = &args.user {
        ctx = ctx.with_user(user);
    }

    let report = service.run(&ctx, predictor.as_mut()).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }

    Ok(())
}

fn load_predictor(path: Option<&Path>, window_size: usize) -> Result<Box<dyn Predictor>> {
    let Some(path) = path else {
        warn!("No model given, forecasting with the persistence baseline");
        return Ok(Box::new(PersistencePredictor));
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let model = LinearPredictor::load(path)?;
            info!("Loaded linear model from {}", path.display());
            Ok(Box::new(model))
        }
        #[cfg(feature = "onnx")]
        Some("onnx") => Ok(Box::new(ml::OnnxPredictor::load(path, window_size)?)),
        #[cfg(not(feature = "onnx"))]
        Some("onnx") => {
            let _ = window_size;
            Err(anyhow!("ONNX models need a build with the 'onnx' feature: {}", path.display()))
        }
        _ => Err(anyhow!("Unsupported model format: {}", path.display())),
    }
}
