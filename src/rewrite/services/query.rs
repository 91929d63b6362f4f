//! Tiered query rewriting against an optimised target schema.

use super::{pattern, structural};
use crate::rewrite::domain::{
    RewriteNote, RewriteResult, RewriteTier, TableCatalog, TargetLocation, TierFailure,
};
use std::sync::Arc;
use tracing::warn;

/// Rewrites workload queries for one task.
///
/// The rewriter shares the task's table catalog read-only, so clones can
/// run on separate threads.
#[derive(Debug, Clone)]
pub struct QueryRewriter {
    catalog: Arc<TableCatalog>,
    target: TargetLocation,
    row_limit: u64,
}

impl QueryRewriter {
    /// Row bound appended to unbounded queries unless configured otherwise.
    pub const DEFAULT_ROW_LIMIT: u64 = 10_000;

    /// Creates a rewriter for the given catalog and target schema.
    #[must_use]
    pub const fn new(catalog: Arc<TableCatalog>, target: TargetLocation) -> Self {
        Self {
            catalog,
            target,
            row_limit: Self::DEFAULT_ROW_LIMIT,
        }
    }

    /// Sets the row bound appended to unbounded queries.
    #[must_use]
    pub const fn with_row_limit(mut self, row_limit: u64) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Returns the target schema queries are repointed to.
    #[must_use]
    pub const fn target(&self) -> &TargetLocation {
        &self.target
    }

    /// Rewrites one query.
    ///
    /// Never fails: text the parser rejects is handled by the pattern tier
    /// and otherwise returned unchanged.
    #[must_use]
    pub fn rewrite(&self, sql: &str) -> RewriteResult {
        let context = structural::QueryContext {
            catalog: &self.catalog,
            target: &self.target,
            row_limit: self.row_limit,
        };
        match structural::rewrite_statement(sql, &context) {
            Ok((statement, notes)) => RewriteResult::new(statement, RewriteTier::Structural, notes),
            Err(failure) => self.degrade(sql, &failure),
        }
    }

    fn degrade(&self, sql: &str, failure: &TierFailure) -> RewriteResult {
        let reason = failure.to_string();
        warn!(reason = %reason, "parse degraded: query handled by pattern tier");
        let mut notes = vec![RewriteNote::ParseDegraded { reason }];
        match pattern::append_row_limit(sql, self.row_limit) {
            Some(statement) => {
                notes.push(RewriteNote::RowLimitAppended {
                    limit: self.row_limit,
                });
                RewriteResult::new(statement, RewriteTier::Pattern, notes)
            }
            None => RewriteResult::new(sql.to_owned(), RewriteTier::Unchanged, notes),
        }
    }
}
