//! Port contracts for the advisor and statistics collaborators.

pub mod advisor;
pub mod statistics;

pub use advisor::{AdvisorError, AdvisorResult, StrategyAdvisor};
pub use statistics::{StatisticsError, StatisticsResult, StatisticsSource};
