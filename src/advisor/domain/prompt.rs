//! Prompt material sent to the advisor.

use super::RepairKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Column as presented to the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Column name.
    pub name: String,
    /// Normalised column type.
    pub data_type: String,
    /// Distinct values, when statistics are available.
    pub distinct_values: Option<u64>,
}

/// Table as presented to the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Table name as written in the schema.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnSummary>,
    /// Row count, when statistics are available.
    pub row_count: Option<u64>,
    /// On-disk size, when statistics are available.
    pub size_bytes: Option<u64>,
}

/// Workload query as presented to the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySummary {
    /// Caller-assigned query identifier.
    pub queryid: String,
    /// SQL text.
    pub query: String,
    /// How often the query runs.
    pub runquantity: u64,
    /// Observed execution time, when reported.
    pub executiontime: Option<u64>,
}

/// Everything the advisor is told about one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyContext {
    /// `catalog.schema` the new tables will live in.
    pub target: String,
    /// Tables to lay out.
    pub tables: Vec<TableSummary>,
    /// Workload that will run against them.
    pub queries: Vec<QuerySummary>,
}

/// Instructions for fixing a rejected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairRequest {
    /// Problem family; selects the repair guidance.
    pub kind: RepairKind,
    /// Rendered problems, one per entry.
    pub issues: Vec<String>,
    /// Start of the rejected answer.
    pub previous_output: String,
}

impl RepairRequest {
    /// Number of characters of the rejected answer quoted back.
    pub const QUOTED_CHARS: usize = 800;

    /// Creates a repair request, quoting at most
    /// [`Self::QUOTED_CHARS`] characters of the rejected answer.
    #[must_use]
    pub fn new(kind: RepairKind, issues: Vec<String>, previous_output: &str) -> Self {
        Self {
            kind,
            issues,
            previous_output: previous_output.chars().take(Self::QUOTED_CHARS).collect(),
        }
    }
}

/// Rendered prompt for one advisor attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyPrompt {
    context: Arc<StrategyContext>,
    attempt: u32,
    repair: Option<RepairRequest>,
    text: String,
}

impl StrategyPrompt {
    /// Creates a prompt from its structured and rendered parts.
    #[must_use]
    pub const fn new(
        context: Arc<StrategyContext>,
        attempt: u32,
        repair: Option<RepairRequest>,
        text: String,
    ) -> Self {
        Self {
            context,
            attempt,
            repair,
            text,
        }
    }

    /// Returns the structured request context.
    #[must_use]
    pub fn context(&self) -> &StrategyContext {
        &self.context
    }

    /// Returns the one-based attempt number.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the repair instructions, if this is a retry.
    #[must_use]
    pub const fn repair(&self) -> Option<&RepairRequest> {
        self.repair.as_ref()
    }

    /// Returns the rendered prompt text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}
