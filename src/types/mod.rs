pub mod series;
pub mod trading;
pub mod calendar;

pub use series::*;
pub use trading::*;
pub use calendar::*;
