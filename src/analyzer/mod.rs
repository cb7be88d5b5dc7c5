// Analyzer module: price suggestion and the stand-in trend history.

pub mod synthetic;
pub mod trend;

pub use synthetic::{SyntheticTrend, TrendSource};
pub use trend::{suggest, Suggestion};
