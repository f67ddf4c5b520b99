use thiserror::Error;

/// Failures of a single prediction run. Each one aborts only that run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no price history available{}", for_symbol(.0))]
    NoData(Option<String>),

    #[error("insufficient data: need more than {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("scaler used before fit")]
    NotFitted,

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("could not resolve a ticker for '{0}'")]
    Resolution(String),

    #[error("invalid price series: {0}")]
    InvalidSeries(String),

    #[error("invalid investment amount {amount}: must be between {min} and {max}")]
    InvalidInvestment {
        amount: rust_decimal::Decimal,
        min: rust_decimal::Decimal,
        max: rust_decimal::Decimal,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("simulation overflow: {0}")]
    Overflow(String),
}

fn for_symbol(symbol: &Option<String>) -> String {
    match symbol {
        Some(s) => format!(" for {}", s),
        None => String::new(),
    }
}

impl PipelineError {
    /// User-facing message shown when a run stops on this error.
    pub fn advisory(&self) -> &'static str {
        match self {
            PipelineError::NoData(_) => {
                "No stock data found. Please check the company name or ticker."
            }
            PipelineError::InsufficientData { .. } => {
                "Insufficient data for a reliable forecast or trading strategy."
            }
            PipelineError::NotFitted => "Internal error: prices were not normalized before use.",
            PipelineError::Prediction(_) => {
                "The prediction model failed. Please check the model file and try again."
            }
            PipelineError::Resolution(_) => {
                "Could not find a valid ticker for the given company name."
            }
            PipelineError::InvalidSeries(_) => "The price history contains invalid values.",
            PipelineError::InvalidInvestment { .. } => {
                "Please enter an investment amount within the allowed range."
            }
            PipelineError::Config(_) => "The configuration is invalid.",
            PipelineError::Overflow(_) => {
                "The simulated plan grew past the supported amount. Try a smaller investment."
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
