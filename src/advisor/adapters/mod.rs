//! Adapter implementations of the advisor ports.

pub mod heuristic;
pub mod statistics;

pub use heuristic::HeuristicAdvisor;
pub use statistics::{InMemoryStatisticsSource, NoStatistics};
