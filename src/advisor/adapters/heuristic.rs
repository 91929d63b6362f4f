//! Deterministic advisor driven by column names, types and statistics.

use crate::advisor::{
    domain::{
        CancellationSignal, ColumnSummary, DEFAULT_COMPRESSION, MAX_CLUSTER_COLUMNS,
        MAX_PARTITION_COLUMNS, StrategyDocument, StrategyPrompt, TableStrategy, TableSummary,
    },
    ports::{AdvisorError, AdvisorResult, StrategyAdvisor},
};
use async_trait::async_trait;

const PARTITION_NAME_HINTS: &[&str] = &["date", "time", "created", "updated"];
const PARTITION_TYPE_HINTS: &[&str] = &["DATE", "TIMESTAMP", "TIME"];
const CLUSTER_NAME_HINTS: &[&str] = &["id", "key", "code", "type", "status"];
const MIN_PARTITION_CARDINALITY: u64 = 10;

/// Advisor that derives a strategy from naming conventions.
///
/// Temporal columns become partition candidates and identifier-like columns
/// become cluster candidates. When statistics are present, partition
/// candidates need more than ten distinct values and cluster candidates
/// need more than ten distinct values but fewer than half the rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAdvisor;

impl HeuristicAdvisor {
    /// Creates the advisor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds the strategy for every table in the prompt.
    #[must_use]
    pub fn strategy(prompt: &StrategyPrompt) -> StrategyDocument {
        StrategyDocument {
            tables: prompt.context().tables.iter().map(table_strategy).collect(),
            migrations: Vec::new(),
        }
    }
}

fn table_strategy(table: &TableSummary) -> TableStrategy {
    TableStrategy {
        table_name: table.name.clone(),
        partition_columns: table
            .columns
            .iter()
            .filter(|column| is_partition_candidate(column))
            .take(MAX_PARTITION_COLUMNS)
            .map(|column| column.name.clone())
            .collect(),
        cluster_columns: table
            .columns
            .iter()
            .filter(|column| is_cluster_candidate(column, table.row_count))
            .take(MAX_CLUSTER_COLUMNS)
            .map(|column| column.name.clone())
            .collect(),
        compression: DEFAULT_COMPRESSION.to_owned(),
        rationale: None,
    }
}

fn is_partition_candidate(column: &ColumnSummary) -> bool {
    let name = column.name.to_ascii_lowercase();
    PARTITION_NAME_HINTS.iter().any(|hint| name.contains(hint))
        && PARTITION_TYPE_HINTS
            .iter()
            .any(|hint| column.data_type.contains(hint))
        && column
            .distinct_values
            .is_none_or(|distinct| distinct == 0 || distinct > MIN_PARTITION_CARDINALITY)
}

fn is_cluster_candidate(column: &ColumnSummary, row_count: Option<u64>) -> bool {
    let name = column.name.to_ascii_lowercase();
    if !CLUSTER_NAME_HINTS.iter().any(|hint| name.contains(hint)) {
        return false;
    }
    match (column.distinct_values, row_count) {
        (None | Some(0), _) | (_, None | Some(0)) => true,
        (Some(distinct), Some(rows)) => {
            distinct > MIN_PARTITION_CARDINALITY && distinct.saturating_mul(2) < rows
        }
    }
}

#[async_trait]
impl StrategyAdvisor for HeuristicAdvisor {
    async fn propose(
        &self,
        prompt: &StrategyPrompt,
        cancel: CancellationSignal,
    ) -> AdvisorResult<String> {
        if cancel.is_cancelled() {
            return Err(AdvisorError::Cancelled);
        }
        serde_json::to_string_pretty(&Self::strategy(prompt))
            .map_err(|err| AdvisorError::Call(err.to_string()))
    }
}
