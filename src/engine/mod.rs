pub mod simulator;
pub mod results;
pub mod pipeline;

pub use simulator::PortfolioSimulator;
pub use results::SimulationResult;
pub use pipeline::{ForecastPipeline, PredictionService, RunContext, RunReport};
