//! Rewrite outcomes, provenance tiers, and diagnostic notes.

use serde::{Deserialize, Serialize};

/// Which tier produced a statement or metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteTier {
    /// Produced from a full SQL parse.
    Structural,
    /// Produced by the pattern-based fallback.
    Pattern,
    /// No tier could change the statement.
    Unchanged,
}

impl RewriteTier {
    /// Returns the canonical representation used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Pattern => "pattern",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Diagnostic recorded while rewriting a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewriteNote {
    /// A bare `*` projection was replaced with the table's columns.
    StarExpanded {
        /// Table whose columns were substituted.
        table: String,
    },
    /// A row limit was appended to an unbounded query.
    RowLimitAppended {
        /// Appended limit.
        limit: u64,
    },
    /// A table reference was moved to the optimised schema.
    PathRepointed {
        /// Reference before rewriting.
        from: String,
        /// Reference after rewriting.
        to: String,
    },
    /// Partition-usage check for a partitioned table.
    PartitionFilter {
        /// Partitioned table.
        table: String,
        /// Whether the `WHERE` clause references a partition column.
        used: bool,
    },
    /// Join-key check against a clustered table.
    ClusterJoin {
        /// Clustered table on the joined side.
        table: String,
        /// Whether the join condition references a cluster column.
        aligned: bool,
    },
    /// Structural parsing failed and the pattern tier was used.
    ParseDegraded {
        /// Parser message explaining the failure.
        reason: String,
    },
}

/// Rewritten statement with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteResult {
    statement: String,
    tier: RewriteTier,
    notes: Vec<RewriteNote>,
}

impl RewriteResult {
    /// Creates a rewrite result.
    #[must_use]
    pub const fn new(statement: String, tier: RewriteTier, notes: Vec<RewriteNote>) -> Self {
        Self {
            statement,
            tier,
            notes,
        }
    }

    /// Returns the rewritten statement text.
    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Returns the tier that produced the statement.
    #[must_use]
    pub const fn tier(&self) -> RewriteTier {
        self.tier
    }

    /// Returns the diagnostics recorded during the rewrite.
    #[must_use]
    pub fn notes(&self) -> &[RewriteNote] {
        &self.notes
    }

    /// Returns `true` when structural parsing failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.notes
            .iter()
            .any(|note| matches!(note, RewriteNote::ParseDegraded { .. }))
    }

    /// Consumes the result, returning the statement text.
    #[must_use]
    pub fn into_statement(self) -> String {
        self.statement
    }
}
