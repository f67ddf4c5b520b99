pub mod planner;

pub use planner::TradePlanner;
