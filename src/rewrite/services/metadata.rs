//! Table metadata building from schema statements.

use super::{pattern, structural};
use crate::rewrite::domain::{RewriteTier, TableCatalog, TableMetadata, TierFailure};
use tracing::warn;

/// Schema statement that produced no metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStatement {
    /// Zero-based position of the statement in the input.
    pub index: usize,
    /// Why no tier could describe the statement.
    pub reason: TierFailure,
}

/// Catalog built from schema statements, with per-statement diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataReport {
    catalog: TableCatalog,
    degraded: Vec<usize>,
    skipped: Vec<SkippedStatement>,
}

impl MetadataReport {
    /// Returns the built catalog.
    #[must_use]
    pub const fn catalog(&self) -> &TableCatalog {
        &self.catalog
    }

    /// Consumes the report, returning the catalog.
    #[must_use]
    pub fn into_catalog(self) -> TableCatalog {
        self.catalog
    }

    /// Returns the positions of statements handled by the pattern tier.
    #[must_use]
    pub fn degraded(&self) -> &[usize] {
        &self.degraded
    }

    /// Returns the statements no tier could describe.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedStatement] {
        &self.skipped
    }
}

/// Describes the tables defined by one schema statement.
///
/// The structural tier is tried first. Text the parser rejects falls back
/// to the pattern tier; text that parses but defines no table does not.
///
/// # Errors
///
/// Returns the [`TierFailure`] of the last tier attempted when no table
/// could be described.
pub fn describe_tables(sql: &str) -> Result<Vec<TableMetadata>, TierFailure> {
    match structural::table_metadata(sql) {
        Err(TierFailure::Parser(reason)) => {
            warn!(reason = %reason, "parse degraded: schema statement handled by pattern tier");
            pattern::table_metadata(sql)
        }
        outcome => outcome,
    }
}

/// Builds a table catalog from an ordered list of schema statements.
///
/// Statements that no tier can describe are recorded and skipped.
pub fn build_catalog<'a, I>(statements: I) -> MetadataReport
where
    I: IntoIterator<Item = &'a str>,
{
    let mut report = MetadataReport::default();
    for (index, sql) in statements.into_iter().enumerate() {
        match describe_tables(sql) {
            Ok(tables) => {
                for table in tables {
                    if table.tier() == RewriteTier::Pattern && report.degraded.last() != Some(&index)
                    {
                        report.degraded.push(index);
                    }
                    report.catalog.insert(table);
                }
            }
            Err(reason) => {
                warn!(statement = index, reason = %reason, "schema statement produced no table metadata");
                report.skipped.push(SkippedStatement { index, reason });
            }
        }
    }
    report
}
