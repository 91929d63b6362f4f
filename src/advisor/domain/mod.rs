//! Domain model for strategy negotiation.

mod cancellation;
mod error;
mod prompt;
mod statistics;
mod strategy;

pub use cancellation::{CancellationHandle, CancellationSignal};
pub use error::{RepairKind, StrategyIssue};
pub use prompt::{
    ColumnSummary, QuerySummary, RepairRequest, StrategyContext, StrategyPrompt, TableSummary,
};
pub use statistics::{StatisticsByTable, TableStatistics};
pub use strategy::{
    DEFAULT_COMPRESSION, MAX_CLUSTER_COLUMNS, MAX_PARTITION_COLUMNS, MigrationProposal,
    SUPPORTED_CODECS, StrategyDocument, TableStrategy,
};
