//! Strategy validation rules.
//!
//! Each rule is a pure function checking one aspect of a proposed
//! strategy. [`validate_strategy`] runs every rule and collects all issues
//! so a single repair prompt can address them together.

use std::collections::HashSet;

use crate::advisor::domain::{
    MAX_CLUSTER_COLUMNS, MAX_PARTITION_COLUMNS, MigrationProposal, SUPPORTED_CODECS,
    StrategyDocument, StrategyIssue, TableStrategy,
};
use crate::rewrite::domain::{TableCatalog, TableMetadata, TargetLocation};
use crate::rewrite::services::{parse, table_name};
use sqlparser::ast::Statement;

/// Resolves the table a strategy refers to.
///
/// # Errors
///
/// Returns [`StrategyIssue::UnknownTable`] when the catalog has no such
/// table.
pub fn validate_known_table<'a>(
    strategy: &TableStrategy,
    catalog: &'a TableCatalog,
) -> Result<&'a TableMetadata, StrategyIssue> {
    catalog
        .get(strategy.unqualified_name())
        .ok_or_else(|| StrategyIssue::UnknownTable(strategy.table_name.clone()))
}

/// Validates that every partition and cluster column exists.
///
/// # Errors
///
/// Returns [`StrategyIssue::UnknownColumn`] for the first missing column.
pub fn validate_columns_exist(
    strategy: &TableStrategy,
    table: &TableMetadata,
) -> Result<(), StrategyIssue> {
    let missing = strategy
        .partition_columns
        .iter()
        .chain(&strategy.cluster_columns)
        .find(|column| !table.has_column(column));
    if let Some(column) = missing {
        return Err(StrategyIssue::UnknownColumn {
            table: strategy.table_name.clone(),
            column: column.clone(),
        });
    }
    Ok(())
}

/// Validates the partition column count.
///
/// # Errors
///
/// Returns [`StrategyIssue::TooManyPartitionColumns`] above
/// [`MAX_PARTITION_COLUMNS`].
pub fn validate_partition_count(strategy: &TableStrategy) -> Result<(), StrategyIssue> {
    let count = strategy.partition_columns.len();
    if count > MAX_PARTITION_COLUMNS {
        return Err(StrategyIssue::TooManyPartitionColumns {
            table: strategy.table_name.clone(),
            count,
            limit: MAX_PARTITION_COLUMNS,
        });
    }
    Ok(())
}

/// Validates the cluster column count.
///
/// # Errors
///
/// Returns [`StrategyIssue::TooManyClusterColumns`] above
/// [`MAX_CLUSTER_COLUMNS`].
pub fn validate_cluster_count(strategy: &TableStrategy) -> Result<(), StrategyIssue> {
    let count = strategy.cluster_columns.len();
    if count > MAX_CLUSTER_COLUMNS {
        return Err(StrategyIssue::TooManyClusterColumns {
            table: strategy.table_name.clone(),
            count,
            limit: MAX_CLUSTER_COLUMNS,
        });
    }
    Ok(())
}

/// Validates the compression codec.
///
/// # Errors
///
/// Returns [`StrategyIssue::InvalidCompression`] when the codec is empty or
/// not in [`SUPPORTED_CODECS`].
pub fn validate_compression(strategy: &TableStrategy) -> Result<(), StrategyIssue> {
    let codec = strategy.compression.trim();
    if !SUPPORTED_CODECS
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(codec))
    {
        return Err(StrategyIssue::InvalidCompression {
            table: strategy.table_name.clone(),
            codec: strategy.compression.clone(),
        });
    }
    Ok(())
}

/// Validates one proposed migration.
///
/// A migration must be a single statement: either an `INSERT` into the
/// target schema or a read-only query such as a row-count check.
///
/// # Errors
///
/// Returns [`StrategyIssue::MigrationSyntax`] when the text is not one
/// parseable statement, or [`StrategyIssue::MigrationTarget`] when it
/// writes anywhere else.
pub fn validate_migration(
    index: usize,
    migration: &MigrationProposal,
    target: &TargetLocation,
) -> Result<(), StrategyIssue> {
    let statements = parse(&migration.statement).map_err(|failure| StrategyIssue::MigrationSyntax {
        index,
        reason: failure.to_string(),
    })?;
    let [statement] = statements.as_slice() else {
        return Err(StrategyIssue::MigrationSyntax {
            index,
            reason: format!("expected one statement, found {}", statements.len()),
        });
    };
    let wrong_target = || StrategyIssue::MigrationTarget {
        index,
        expected: target.to_string(),
    };
    match statement {
        Statement::Query(_) => Ok(()),
        Statement::Insert(insert) => {
            let name = table_name(&insert.table_name).map_err(|_| wrong_target())?;
            let in_target = name
                .catalog()
                .is_some_and(|catalog| catalog.eq_ignore_ascii_case(target.catalog()))
                && name
                    .schema()
                    .is_some_and(|schema| schema.eq_ignore_ascii_case(target.schema()));
            if in_target { Ok(()) } else { Err(wrong_target()) }
        }
        _ => Err(wrong_target()),
    }
}

/// Runs every rule over a strategy document.
///
/// # Errors
///
/// Returns every issue found, in table then migration order.
pub fn validate_strategy(
    document: &StrategyDocument,
    catalog: &TableCatalog,
    target: &TargetLocation,
) -> Result<(), Vec<StrategyIssue>> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    for strategy in &document.tables {
        if !seen.insert(strategy.unqualified_name().to_ascii_lowercase()) {
            issues.push(StrategyIssue::DuplicateTable(strategy.table_name.clone()));
            continue;
        }
        match validate_known_table(strategy, catalog) {
            Ok(table) => issues.extend(validate_columns_exist(strategy, table).err()),
            Err(issue) => issues.push(issue),
        }
        issues.extend(validate_partition_count(strategy).err());
        issues.extend(validate_cluster_count(strategy).err());
        issues.extend(validate_compression(strategy).err());
    }
    for (index, migration) in document.migrations.iter().enumerate() {
        issues.extend(validate_migration(index, migration, target).err());
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
